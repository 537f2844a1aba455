//! Reliability EM.
//!
//! A participant with reliability `r` is modelled as answering the true
//! choice with probability `r` and each wrong choice with probability
//! `(1 - r) / (C - 1)`, where `C` is the size of the global choice set.

use std::collections::BTreeMap;

use tracing::{debug, field, info, info_span};
use verity_core::constants::ZENCROWD_INITIAL_RELIABILITY;
use verity_core::errors::InferenceError;

use super::types::{ZenCrowdParams, ZenCrowdResult};
use crate::algorithm::Algorithm;
use crate::convergence::{abs_delta, Convergence};
use crate::estimators::TruthEstimator;
use crate::index::{AnswerIndex, Tally};
use crate::parallel::map_range;

#[derive(Debug, Clone)]
pub struct ZenCrowd {
    params: ZenCrowdParams,
}

#[derive(Debug, Clone)]
struct Snapshot {
    labels: Vec<Vec<f64>>,
    reliabilities: Vec<f64>,
}

impl ZenCrowd {
    pub fn new(params: ZenCrowdParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ZenCrowdParams {
        &self.params
    }
}

impl TruthEstimator for ZenCrowd {
    type Output = ZenCrowdResult;

    fn algorithm(&self) -> Algorithm {
        Algorithm::ZenCrowd
    }

    fn estimate(&self, index: &AnswerIndex) -> ZenCrowdResult {
        let span = info_span!(
            "zencrowd",
            answers = index.len(),
            iteration = field::Empty,
            delta = field::Empty,
            converged = field::Empty,
        );
        let _guard = span.enter();

        let params = &self.params;
        let tally = Tally::from_index(index);
        if tally.is_empty() {
            return ZenCrowdResult::empty();
        }

        let mut reliabilities = vec![ZENCROWD_INITIAL_RELIABILITY; tally.participants.len()];
        let mut previous: Option<Snapshot> = None;
        let mut iteration = 0;

        let (snapshot, convergence) = loop {
            iteration += 1;

            let labels = expectation(&tally, &reliabilities, params.parallel);
            let next = maximization(&tally, &labels, params.parallel);
            reliabilities = next.clone();
            let current = Snapshot {
                labels,
                reliabilities: next,
            };

            let delta = previous
                .as_ref()
                .map_or(f64::INFINITY, |prev| {
                    abs_delta(&prev.reliabilities, &current.reliabilities)
                });
            debug!(iteration, delta, "zencrowd iteration");

            // As with Dawid-Skene, report the snapshot the new iteration was
            // compared against.
            if delta < params.convergence_threshold {
                let reported = previous.unwrap_or(current);
                break (
                    reported,
                    Convergence {
                        iterations: iteration,
                        converged: true,
                        final_delta: delta,
                    },
                );
            }
            if iteration >= params.max_iterations {
                let reported = previous.unwrap_or(current);
                break (
                    reported,
                    Convergence {
                        iterations: iteration,
                        converged: false,
                        final_delta: delta,
                    },
                );
            }
            previous = Some(current);
        };

        convergence.record(&span);
        info!(
            iterations = convergence.iterations,
            converged = convergence.converged,
            "zencrowd complete"
        );

        ZenCrowdResult {
            label_probabilities: tally
                .questions
                .iter()
                .cloned()
                .zip(snapshot.labels.iter().map(|row| {
                    tally
                        .choices
                        .iter()
                        .cloned()
                        .zip(row.iter().copied())
                        .collect::<BTreeMap<_, _>>()
                }))
                .collect(),
            reliabilities: tally
                .participants
                .iter()
                .cloned()
                .zip(snapshot.reliabilities)
                .collect(),
            convergence,
        }
    }
}

/// Posterior over the global choice set for every question.
fn expectation(tally: &Tally, reliabilities: &[f64], parallel: bool) -> Vec<Vec<f64>> {
    let c = tally.choices.len();
    map_range(tally.questions.len(), parallel, |q| {
        let mut scores = vec![1.0; c];
        for response in &tally.by_question[q] {
            let r = reliabilities[response.participant];
            let other = if c > 1 { (1.0 - r) / (c - 1) as f64 } else { 0.0 };
            let n = f64::from(response.count);
            for (j, score) in scores.iter_mut().enumerate() {
                let factor = if j == response.choice { r } else { other };
                *score *= factor.powf(n);
            }
        }
        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            scores.iter_mut().for_each(|s| *s /= total);
        } else {
            scores.fill(1.0 / c as f64);
        }
        scores
    })
}

/// Mean posterior mass on the choice each participant actually picked.
fn maximization(tally: &Tally, labels: &[Vec<f64>], parallel: bool) -> Vec<f64> {
    map_range(tally.participants.len(), parallel, |p| {
        let mut mass = 0.0;
        let mut answers = 0u32;
        for response in &tally.by_participant[p] {
            mass += f64::from(response.count) * labels[response.question][response.choice];
            answers += response.count;
        }
        mass / f64::from(answers)
    })
}
