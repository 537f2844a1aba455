//! Iterative weighted voting: CATD (Li et al., 2014) and CRH (Li et al., 2014).
//!
//! Both start from the majority answer, then alternate between a source-weight
//! update and a weighted re-vote until the weights stop moving. They differ
//! only in how a source's mismatches turn into a weight.

pub mod catd;
pub mod crh;
pub mod types;

use std::collections::BTreeMap;

use tracing::debug;

use crate::algorithm::Algorithm;
use crate::convergence::{abs_delta, argmax, Convergence};
use crate::estimators::majority::majority_labels;
use crate::index::Tally;
use crate::parallel::map_range;

pub use catd::Catd;
pub use crh::Crh;
pub use types::{CatdParams, CrhParams, WeightedVotingResult};

pub(crate) struct VotingLoop {
    pub convergence_threshold: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

/// Per question, `(choice, weighted votes)` for every observed choice.
type VoteTable = Vec<Vec<(usize, f64)>>;

/// Run the shared iterate/vote skeleton. `update_weights` maps the current
/// truth assignment to one weight per participant.
pub(crate) fn run_weighted_vote<F>(
    tally: &Tally,
    settings: &VotingLoop,
    algorithm: Algorithm,
    update_weights: F,
) -> WeightedVotingResult
where
    F: Fn(&[usize]) -> Vec<f64>,
{
    if tally.is_empty() {
        return WeightedVotingResult::empty(algorithm);
    }

    let mut truth = majority_labels(tally);
    let mut previous: Option<Vec<f64>> = None;
    let mut iteration = 0;

    let (weights, votes, convergence) = loop {
        iteration += 1;
        let weights = update_weights(&truth);
        let votes = vote(tally, &weights, settings.parallel);
        truth = votes
            .iter()
            .map(|row| argmax(row.iter().copied()).map_or(0, |(c, _)| c))
            .collect();

        let delta = previous
            .as_ref()
            .map_or(f64::INFINITY, |prev| abs_delta(prev, &weights));
        debug!(algorithm = %algorithm, iteration, delta, "weight update");

        if delta < settings.convergence_threshold {
            break (
                weights,
                votes,
                Convergence {
                    iterations: iteration,
                    converged: true,
                    final_delta: delta,
                },
            );
        }
        if iteration >= settings.max_iterations {
            break (
                weights,
                votes,
                Convergence {
                    iterations: iteration,
                    converged: false,
                    final_delta: delta,
                },
            );
        }
        previous = Some(weights);
    };

    WeightedVotingResult {
        algorithm,
        truth: tally
            .questions
            .iter()
            .cloned()
            .zip(truth.iter().map(|&c| tally.choices[c].clone()))
            .collect(),
        weights: tally.participants.iter().cloned().zip(weights).collect(),
        vote_scores: tally
            .questions
            .iter()
            .cloned()
            .zip(votes.into_iter().map(|row| {
                row.into_iter()
                    .map(|(c, score)| (tally.choices[c].clone(), score))
                    .collect::<BTreeMap<_, _>>()
            }))
            .collect(),
        convergence,
    }
}

/// Sum of source weights behind each observed choice of each question.
fn vote(tally: &Tally, weights: &[f64], parallel: bool) -> VoteTable {
    map_range(tally.questions.len(), parallel, |q| {
        let mut totals: BTreeMap<usize, f64> = BTreeMap::new();
        for response in &tally.by_question[q] {
            *totals.entry(response.choice).or_insert(0.0) +=
                weights[response.participant] * f64::from(response.count);
        }
        totals.into_iter().collect()
    })
}

/// How many of `participant`'s answers disagree with `truth`.
pub(crate) fn mismatches(tally: &Tally, truth: &[usize], participant: usize) -> u32 {
    tally.by_participant[participant]
        .iter()
        .filter(|r| r.choice != truth[r.question])
        .map(|r| r.count)
        .sum()
}
