//! Disagreement metrics (Dumitrache et al., CrowdTruth 2.0).
//!
//! Instead of a single truth this estimator scores how reliable each
//! participant is, how clear each question is and, for closed tasks, how
//! well each choice is understood. The three scores are defined in terms of
//! one another and iterated from all-ones until none moves by `delta`.
//!
//! Downstream consumers read the clarity table: the clearest choice of a
//! question is its implied answer.

mod metrics;
pub mod types;
mod vectors;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, field, info, info_span};
use verity_core::errors::InferenceError;
use verity_core::ParticipantId;

use crate::algorithm::Algorithm;
use crate::convergence::{max_abs_delta, Convergence};
use crate::estimators::TruthEstimator;
use crate::index::{AnswerIndex, Tally};
use metrics::Scores;
use vectors::Vectors;

pub use types::{CrowdTruthParams, CrowdTruthResult, TaskKind};

#[derive(Debug, Clone)]
pub struct CrowdTruth {
    params: CrowdTruthParams,
}

impl CrowdTruth {
    pub fn new(params: CrowdTruthParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CrowdTruthParams {
        &self.params
    }

    /// Re-run the metrics over the answers of `participants` only, e.g. the
    /// highest- or lowest-quality workers of an earlier run.
    pub fn estimate_among(
        &self,
        index: &AnswerIndex,
        participants: &BTreeSet<ParticipantId>,
    ) -> CrowdTruthResult {
        let subset = index.filter_participants(|p| participants.contains(p));
        debug!(
            kept = subset.participants().len(),
            of = index.participants().len(),
            "crowdtruth participant filter"
        );
        self.estimate(&subset)
    }
}

impl TruthEstimator for CrowdTruth {
    type Output = CrowdTruthResult;

    fn algorithm(&self) -> Algorithm {
        match self.params.task {
            TaskKind::Closed => Algorithm::CrowdtruthClosed,
            TaskKind::Open => Algorithm::CrowdtruthOpen,
        }
    }

    fn estimate(&self, index: &AnswerIndex) -> CrowdTruthResult {
        let span = info_span!(
            "crowdtruth",
            algorithm = %self.algorithm(),
            answers = index.len(),
            iteration = field::Empty,
            delta = field::Empty,
            converged = field::Empty,
        );
        let _guard = span.enter();

        let params = &self.params;
        let closed = params.task == TaskKind::Closed;
        let tally = if closed {
            Tally::with_extra_choices(index, &params.vocabulary)
        } else {
            Tally::from_index(index)
        };
        if tally.is_empty() {
            return CrowdTruthResult::empty(params.task);
        }
        let vectors = Vectors::from_tally(&tally);

        let mut scores = Scores::initial(
            tally.choices.len(),
            tally.questions.len(),
            tally.participants.len(),
        );
        let mut iteration = 0;

        let convergence = loop {
            iteration += 1;
            let next = Scores {
                choice: if closed {
                    metrics::choice_quality(&vectors, &scores, params.parallel)
                } else {
                    scores.choice.clone()
                },
                question: metrics::question_quality(&vectors, &scores, params.parallel),
                participant: metrics::participant_quality(&vectors, &scores, params.parallel),
            };

            let delta = max_abs_delta(&scores.choice, &next.choice)
                .max(max_abs_delta(&scores.question, &next.question))
                .max(max_abs_delta(&scores.participant, &next.participant));
            debug!(iteration, delta, "crowdtruth iteration");
            scores = next;

            if delta < params.delta {
                break Convergence {
                    iterations: iteration,
                    converged: true,
                    final_delta: delta,
                };
            }
            if iteration >= params.max_iterations {
                break Convergence {
                    iterations: iteration,
                    converged: false,
                    final_delta: delta,
                };
            }
        };

        convergence.record(&span);
        info!(
            iterations = convergence.iterations,
            converged = convergence.converged,
            "crowdtruth complete"
        );

        let clarity_rows = metrics::clarity(&vectors, &scores.participant, |q| {
            if closed {
                (0..tally.choices.len()).collect()
            } else {
                let mut observed: Vec<usize> =
                    tally.by_question[q].iter().map(|r| r.choice).collect();
                observed.sort_unstable();
                observed.dedup();
                observed
            }
        });

        CrowdTruthResult {
            task: params.task,
            choice_quality: if closed {
                tally.choices.iter().cloned().zip(scores.choice).collect()
            } else {
                BTreeMap::new()
            },
            participant_quality: tally
                .participants
                .iter()
                .cloned()
                .zip(scores.participant)
                .collect(),
            question_quality: tally.questions.iter().cloned().zip(scores.question).collect(),
            clarity: tally
                .questions
                .iter()
                .cloned()
                .zip(clarity_rows.into_iter().map(|row| {
                    row.into_iter()
                        .map(|(c, score)| (tally.choices[c].clone(), score))
                        .collect::<BTreeMap<_, _>>()
                }))
                .collect(),
            convergence,
        }
    }
}
