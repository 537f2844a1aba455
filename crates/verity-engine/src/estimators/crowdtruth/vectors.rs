//! Sparse per-(participant, question) answer vectors and the pair lists the
//! quality metrics iterate over.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::index::Tally;

/// `(choice, count)` pairs sorted by choice.
pub(crate) type SparseVector = SmallVec<[(usize, f64); 4]>;

/// One participant's answers to one question.
#[derive(Debug, Clone)]
pub(crate) struct Cell {
    pub participant: usize,
    pub question: usize,
    pub counts: SparseVector,
}

impl Cell {
    pub fn count(&self, choice: usize) -> f64 {
        self.counts
            .binary_search_by_key(&choice, |&(c, _)| c)
            .map_or(0.0, |i| self.counts[i].1)
    }
}

/// An ordered pair of distinct participants and the cells of every question
/// both answered, as `(first's cell, second's cell)`.
#[derive(Debug, Clone)]
pub(crate) struct Pair {
    pub first: usize,
    pub second: usize,
    pub shared: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub(crate) struct Vectors {
    pub cells: Vec<Cell>,
    /// Cell positions per question, in participant order.
    pub by_question: Vec<Vec<usize>>,
    /// Cell positions per participant, in question order.
    pub by_participant: Vec<Vec<usize>>,
    /// Sorted by `(first, second)`.
    pub pairs: Vec<Pair>,
}

impl Vectors {
    pub fn from_tally(tally: &Tally) -> Self {
        let mut cells = Vec::new();
        let mut by_question = vec![Vec::new(); tally.questions.len()];
        let mut by_participant = vec![Vec::new(); tally.participants.len()];

        for q in 0..tally.questions.len() {
            for (participant, responses) in tally.vectors(q) {
                let position = cells.len();
                cells.push(Cell {
                    participant,
                    question: q,
                    counts: responses
                        .iter()
                        .map(|r| (r.choice, f64::from(r.count)))
                        .collect(),
                });
                by_question[q].push(position);
                by_participant[participant].push(position);
            }
        }

        let mut shared: FxHashMap<(usize, usize), Vec<(usize, usize)>> = FxHashMap::default();
        for positions in &by_question {
            for &a in positions {
                for &b in positions {
                    if a != b {
                        shared
                            .entry((cells[a].participant, cells[b].participant))
                            .or_default()
                            .push((a, b));
                    }
                }
            }
        }
        let mut pairs: Vec<Pair> = shared
            .into_iter()
            .map(|((first, second), shared)| Pair {
                first,
                second,
                shared,
            })
            .collect();
        pairs.sort_unstable_by_key(|pair| (pair.first, pair.second));

        Self {
            cells,
            by_question,
            by_participant,
            pairs,
        }
    }
}

/// Cosine similarity with each component scaled by `weights[choice]`.
/// Zero when either vector has no weighted magnitude.
pub(crate) fn weighted_cosine(a: &[(usize, f64)], b: &[(usize, f64)], weights: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next_a = a.get(i).map(|&(c, _)| c);
        let next_b = b.get(j).map(|&(c, _)| c);
        match (next_a, next_b) {
            (Some(ca), Some(cb)) if ca == cb => {
                let w = weights[ca];
                dot += a[i].1 * b[j].1 * w;
                norm_a += a[i].1 * a[i].1 * w;
                norm_b += b[j].1 * b[j].1 * w;
                i += 1;
                j += 1;
            }
            (Some(ca), Some(cb)) if ca < cb => {
                norm_a += a[i].1 * a[i].1 * weights[ca];
                i += 1;
            }
            (Some(ca), None) => {
                norm_a += a[i].1 * a[i].1 * weights[ca];
                i += 1;
            }
            (_, Some(cb)) => {
                norm_b += b[j].1 * b[j].1 * weights[cb];
                j += 1;
            }
            (None, None) => break,
        }
    }
    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::AnswerIndex;
    use verity_core::Answer;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        let w = [1.0, 1.0, 1.0];
        assert!((weighted_cosine(&[(0, 2.0)], &[(0, 1.0)], &w) - 1.0).abs() < 1e-12);
        assert_eq!(weighted_cosine(&[(0, 1.0)], &[(1, 1.0)], &w), 0.0);
    }

    #[test]
    fn test_cosine_zero_weight_component() {
        // Only choice 1 carries weight, and only the second vector has it.
        let w = [0.0, 1.0];
        assert_eq!(weighted_cosine(&[(0, 1.0)], &[(0, 1.0), (1, 1.0)], &w), 0.0);
    }

    #[test]
    fn test_cosine_partial_overlap() {
        let w = [1.0, 1.0, 1.0];
        let c = weighted_cosine(&[(0, 1.0), (1, 1.0)], &[(1, 1.0), (2, 1.0)], &w);
        assert!((c - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pairs_cover_shared_questions() {
        let index = AnswerIndex::new(vec![
            Answer::new("w1", "q1", "a"),
            Answer::new("w2", "q1", "a"),
            Answer::new("w2", "q2", "b"),
            Answer::new("w3", "q2", "b"),
        ]);
        let vectors = Vectors::from_tally(&Tally::from_index(&index));
        let keys: Vec<(usize, usize)> = vectors.pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(keys, vec![(0, 1), (1, 0), (1, 2), (2, 1)]);
        assert!(vectors.pairs.iter().all(|p| p.shared.len() == 1));
        assert_eq!(vectors.by_participant[1].len(), 2);
    }
}
