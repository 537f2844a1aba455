//! Majority voting with iterative participant filtering.
//!
//! Each round aggregates by plain majority, scores every remaining
//! participant by the share of their answers that match the outcome, and
//! drops those below the agreement threshold. A question whose top count is
//! tied has no single outcome, so every answer to it counts as agreeing.
//! Rounds repeat until nobody is dropped; the last round's majority is the
//! result. Each round either stops or removes at least one participant, so
//! the loop runs at most `participants + 1` times.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, info_span};
use verity_core::config::InferenceConfig;
use verity_core::constants::DEFAULT_MAJORITY_AGREEMENT_THRESHOLD;
use verity_core::errors::{InferenceError, LookupError};
use verity_core::ParticipantId;

use super::majority::{majority_result, MajorityResult};
use super::TruthEstimator;
use crate::algorithm::Algorithm;
use crate::index::{AnswerIndex, Tally};

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveMajorityParams {
    /// Participants whose agreement falls below this are dropped. In `[0, 1]`.
    pub agreement_threshold: f64,
}

impl Default for AdaptiveMajorityParams {
    fn default() -> Self {
        Self {
            agreement_threshold: DEFAULT_MAJORITY_AGREEMENT_THRESHOLD,
        }
    }
}

impl AdaptiveMajorityParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            agreement_threshold: config.effective_majority_agreement_threshold(),
        }
    }

    pub fn with_threshold(agreement_threshold: f64) -> Self {
        Self {
            agreement_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        if (0.0..=1.0).contains(&self.agreement_threshold) {
            Ok(())
        } else {
            Err(InferenceError::invalid(
                "majority_agreement_threshold",
                format!(
                    "must be between 0 and 1 inclusive, got {}",
                    self.agreement_threshold
                ),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptiveMajorityResult {
    /// Majority vote over the participants that were never dropped.
    pub majority: MajorityResult,
    /// Final-round agreement of every retained participant.
    pub agreement: BTreeMap<ParticipantId, f64>,
    /// Dropped participants, with their agreement in the round that dropped them.
    pub excluded: BTreeMap<ParticipantId, f64>,
    /// Aggregation rounds run, the final one included.
    pub rounds: usize,
}

impl AdaptiveMajorityResult {
    /// Agreement of a retained participant, or of a dropped one at the time
    /// it was dropped.
    pub fn agreement_of(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        self.agreement
            .get(participant)
            .or_else(|| self.excluded.get(participant))
            .copied()
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))
    }

    pub fn is_excluded(&self, participant: &ParticipantId) -> bool {
        self.excluded.contains_key(participant)
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveMajorityVote {
    params: AdaptiveMajorityParams,
}

impl AdaptiveMajorityVote {
    pub fn new(params: AdaptiveMajorityParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AdaptiveMajorityParams {
        &self.params
    }
}

impl TruthEstimator for AdaptiveMajorityVote {
    type Output = AdaptiveMajorityResult;

    fn algorithm(&self) -> Algorithm {
        Algorithm::AdaptiveMajority
    }

    fn estimate(&self, index: &AnswerIndex) -> AdaptiveMajorityResult {
        let threshold = self.params.agreement_threshold;
        let span = info_span!("adaptive_majority", answers = index.len(), threshold);
        let _guard = span.enter();

        let mut excluded: BTreeMap<ParticipantId, f64> = BTreeMap::new();
        let mut filtered: Option<AnswerIndex> = None;
        let mut rounds = 0;

        let (tally, agreement) = loop {
            let current = filtered.as_ref().unwrap_or(index);
            let tally = Tally::from_index(current);
            if tally.is_empty() {
                break (tally, Vec::new());
            }
            rounds += 1;

            let agreement = participant_agreement(&tally);
            let dropped: Vec<usize> = (0..tally.participants.len())
                .filter(|&p| agreement[p] < threshold)
                .collect();
            debug!(round = rounds, dropped = dropped.len(), "agreement filter");
            if dropped.is_empty() {
                break (tally, agreement);
            }

            for p in dropped {
                excluded.insert(tally.participants[p].clone(), agreement[p]);
            }
            let next = current.filter_participants(|p| !excluded.contains_key(p));
            filtered = Some(next);
        };

        info!(
            rounds,
            retained = tally.participants.len(),
            excluded = excluded.len(),
            "adaptive majority complete"
        );
        AdaptiveMajorityResult {
            majority: majority_result(&tally),
            agreement: tally.participants.iter().cloned().zip(agreement).collect(),
            excluded,
            rounds,
        }
    }
}

/// Share of each participant's answers matching the unique majority choice,
/// rounded to four decimals. Answers to a tied question always match.
fn participant_agreement(tally: &Tally) -> Vec<f64> {
    let winners: Vec<Option<usize>> = (0..tally.questions.len())
        .map(|q| unique_top(&tally.choice_counts(q)))
        .collect();
    (0..tally.participants.len())
        .map(|p| {
            let agreed: u32 = tally.by_participant[p]
                .iter()
                .filter(|r| winners[r.question].map_or(true, |w| w == r.choice))
                .map(|r| r.count)
                .sum();
            let share = f64::from(agreed) / f64::from(tally.answer_count(p));
            (share * 1e4).round() / 1e4
        })
        .collect()
}

/// Index of the single highest count; `None` when the top is shared.
fn unique_top(counts: &[u32]) -> Option<usize> {
    let top = counts.iter().copied().max()?;
    let mut at_top = counts.iter().enumerate().filter(|&(_, &n)| n == top);
    let (first, _) = at_top.next()?;
    if at_top.next().is_some() {
        None
    } else {
        Some(first)
    }
}
