//! The three mutually dependent quality scores. Every function reads the
//! previous iteration's `Scores` and produces one fresh score vector.

use std::collections::BTreeMap;

use super::vectors::{weighted_cosine, Vectors};
use crate::parallel::map_range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scores {
    /// Indexed by choice.
    pub choice: Vec<f64>,
    /// Indexed by question.
    pub question: Vec<f64>,
    /// Indexed by participant.
    pub participant: Vec<f64>,
}

impl Scores {
    pub fn initial(choices: usize, questions: usize, participants: usize) -> Self {
        Self {
            choice: vec![1.0; choices],
            question: vec![1.0; questions],
            participant: vec![1.0; participants],
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Per choice: over participant pairs sharing a question, how likely the
/// second picks the choice when the first does, weighted by question quality
/// and by both participants' quality.
pub(crate) fn choice_quality(vectors: &Vectors, prev: &Scores, parallel: bool) -> Vec<f64> {
    map_range(prev.choice.len(), parallel, |choice| {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for pair in &vectors.pairs {
            let mut joint_weighted = 0.0;
            let mut joint = 0.0;
            for &(a, b) in &pair.shared {
                let first = &vectors.cells[a];
                let both = first.count(choice) * vectors.cells[b].count(choice);
                joint_weighted += prev.question[first.question] * both;
                joint += both;
            }
            if joint > 0.0 {
                let weight = prev.participant[pair.first] * prev.participant[pair.second];
                numerator += weight * joint_weighted / joint;
                denominator += weight;
            }
        }
        ratio(numerator, denominator)
    })
}

/// Per question: participant-quality-weighted mean cosine over every ordered
/// pair of its participants.
pub(crate) fn question_quality(vectors: &Vectors, prev: &Scores, parallel: bool) -> Vec<f64> {
    map_range(vectors.by_question.len(), parallel, |q| {
        let cells = &vectors.by_question[q];
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for &a in cells {
            for &b in cells {
                if a == b {
                    continue;
                }
                let (first, second) = (&vectors.cells[a], &vectors.cells[b]);
                let weight = prev.participant[first.participant] * prev.participant[second.participant];
                numerator += weighted_cosine(&first.counts, &second.counts, &prev.choice) * weight;
                denominator += weight;
            }
        }
        ratio(numerator, denominator)
    })
}

/// Per participant: agreement with the weighted crowd on each question times
/// mean pairwise agreement with each co-participant.
pub(crate) fn participant_quality(vectors: &Vectors, prev: &Scores, parallel: bool) -> Vec<f64> {
    map_range(vectors.by_participant.len(), parallel, |p| {
        let mut unit_numerator = 0.0;
        let mut unit_denominator = 0.0;
        let mut pair_numerator = 0.0;
        let mut pair_denominator = 0.0;

        for &own in &vectors.by_participant[p] {
            let cell = &vectors.cells[own];
            let question_weight = prev.question[cell.question];

            let mut crowd: BTreeMap<usize, f64> = BTreeMap::new();
            for &other in &vectors.by_question[cell.question] {
                if other == own {
                    continue;
                }
                let other = &vectors.cells[other];
                let other_weight = prev.participant[other.participant];
                for &(choice, count) in &other.counts {
                    *crowd.entry(choice).or_insert(0.0) += count * other_weight;
                }

                let weight = other_weight * question_weight;
                pair_numerator += weighted_cosine(&cell.counts, &other.counts, &prev.choice) * weight;
                pair_denominator += weight;
            }

            let crowd: Vec<(usize, f64)> = crowd.into_iter().collect();
            unit_numerator += weighted_cosine(&cell.counts, &crowd, &prev.choice) * question_weight;
            unit_denominator += question_weight;
        }

        ratio(unit_numerator, unit_denominator) * ratio(pair_numerator, pair_denominator)
    })
}

/// Per question, `(choice, clarity)` for each choice in `choices_of(q)`.
pub(crate) fn clarity<F>(vectors: &Vectors, participant: &[f64], choices_of: F) -> Vec<Vec<(usize, f64)>>
where
    F: Fn(usize) -> Vec<usize>,
{
    (0..vectors.by_question.len())
        .map(|q| {
            let cells = &vectors.by_question[q];
            let total: f64 = cells
                .iter()
                .map(|&c| participant[vectors.cells[c].participant])
                .sum();
            choices_of(q)
                .into_iter()
                .map(|choice| {
                    let picked: f64 = cells
                        .iter()
                        .map(|&c| {
                            let cell = &vectors.cells[c];
                            cell.count(choice) * participant[cell.participant]
                        })
                        .sum();
                    (choice, ratio(picked, total))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AnswerIndex, Tally};
    use verity_core::Answer;

    fn vectors(answers: Vec<Answer>) -> (Tally, Vectors) {
        let tally = Tally::from_index(&AnswerIndex::new(answers));
        let vectors = Vectors::from_tally(&tally);
        (tally, vectors)
    }

    #[test]
    fn test_unanimous_first_iteration() {
        let (tally, v) = vectors(vec![
            Answer::new("w1", "q1", "a"),
            Answer::new("w2", "q1", "a"),
        ]);
        let prev = Scores::initial(tally.choices.len(), 1, 2);
        assert_eq!(question_quality(&v, &prev, false), vec![1.0]);
        assert_eq!(participant_quality(&v, &prev, false), vec![1.0, 1.0]);
        assert_eq!(choice_quality(&v, &prev, false), vec![1.0]);
    }

    #[test]
    fn test_lone_participant_scores_zero() {
        let (tally, v) = vectors(vec![Answer::new("w1", "q1", "a")]);
        let prev = Scores::initial(tally.choices.len(), 1, 1);
        assert_eq!(question_quality(&v, &prev, false), vec![0.0]);
        assert_eq!(participant_quality(&v, &prev, false), vec![0.0]);
    }

    #[test]
    fn test_clarity_weights_by_participant_quality() {
        let (_, v) = vectors(vec![
            Answer::new("w1", "q1", "a"),
            Answer::new("w2", "q1", "b"),
        ]);
        let rows = clarity(&v, &[0.75, 0.25], |_| vec![0, 1]);
        assert_eq!(rows[0], vec![(0, 0.75), (1, 0.25)]);
    }
}
