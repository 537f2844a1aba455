//! Majority-vote baseline.
//!
//! Also supplies the initial truth assignment for CATD and CRH and the hard
//! initialization of fast Dawid-Skene.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;
use verity_core::errors::LookupError;
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use super::TruthEstimator;
use crate::algorithm::Algorithm;
use crate::convergence::argmax_index;
use crate::index::{AnswerIndex, Tally};

#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityVote;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MajorityResult {
    /// Share of each observed choice among a question's answers.
    pub label_distribution: BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>>,
    pub truth: BTreeMap<QuestionId, ChoiceId>,
    /// Share of each participant's answers that match the majority choice.
    pub agreement: BTreeMap<ParticipantId, f64>,
}

impl MajorityResult {
    pub fn agreement_of(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        self.agreement
            .get(participant)
            .copied()
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))
    }
}

impl TruthEstimator for MajorityVote {
    type Output = MajorityResult;

    fn algorithm(&self) -> Algorithm {
        Algorithm::Majority
    }

    fn estimate(&self, index: &AnswerIndex) -> MajorityResult {
        let result = majority_result(&Tally::from_index(index));
        info!(questions = result.truth.len(), "majority vote complete");
        result
    }
}

/// Vote shares, majority truth and per-participant agreement for a tally.
pub(crate) fn majority_result(tally: &Tally) -> MajorityResult {
    let labels = majority_labels(tally);

    let mut label_distribution = BTreeMap::new();
    let mut truth = BTreeMap::new();
    for (q, question) in tally.questions.iter().enumerate() {
        let counts = tally.choice_counts(q);
        let total: u32 = counts.iter().sum();
        let row: BTreeMap<ChoiceId, f64> = counts
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(c, &n)| (tally.choices[c].clone(), n as f64 / total as f64))
            .collect();
        label_distribution.insert(question.clone(), row);
        truth.insert(question.clone(), tally.choices[labels[q]].clone());
    }

    let agreement = tally
        .participants
        .iter()
        .enumerate()
        .map(|(p, participant)| {
            let responses = &tally.by_participant[p];
            let matching: u32 = responses
                .iter()
                .filter(|r| r.choice == labels[r.question])
                .map(|r| r.count)
                .sum();
            let total = tally.answer_count(p);
            (participant.clone(), matching as f64 / total as f64)
        })
        .collect();

    MajorityResult {
        label_distribution,
        truth,
        agreement,
    }
}

/// Dense majority choice per question. Ties go to the smallest choice.
pub(crate) fn majority_labels(tally: &Tally) -> Vec<usize> {
    (0..tally.questions.len())
        .map(|q| {
            let counts: Vec<f64> = tally.choice_counts(q).into_iter().map(f64::from).collect();
            argmax_index(&counts).unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_core::Answer;

    #[test]
    fn test_majority_tie_goes_to_smallest_choice() {
        let index = AnswerIndex::new(vec![
            Answer::new("w1", "q1", "B"),
            Answer::new("w2", "q1", "A"),
        ]);
        let result = MajorityVote.estimate(&index);
        assert_eq!(result.truth[&QuestionId::new("q1")].as_str(), "A");
    }

    #[test]
    fn test_agreement_counts_repeats() {
        let index = AnswerIndex::new(vec![
            Answer::new("w1", "q1", "A"),
            Answer::new("w2", "q1", "A"),
            Answer::new("w3", "q1", "B"),
            Answer::new("w3", "q1", "A"),
        ]);
        let result = MajorityVote.estimate(&index);
        let w3 = result.agreement_of(&ParticipantId::new("w3")).unwrap();
        assert!((w3 - 0.5).abs() < 1e-12);
        assert!(result.agreement_of(&ParticipantId::new("w9")).is_err());
    }
}
