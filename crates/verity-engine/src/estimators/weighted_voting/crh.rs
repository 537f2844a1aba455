//! Conflict resolution on heterogeneous data, categorical 0/1 loss.
//!
//! Weights are `-ln(loss / max_loss + eps) + eps`, so the worst source sits
//! near zero and a perfect source gets a large but finite weight.

use tracing::{field, info, info_span};
use verity_core::errors::InferenceError;

use super::types::{CrhParams, WeightedVotingResult};
use super::{mismatches, run_weighted_vote, VotingLoop};
use crate::algorithm::Algorithm;
use crate::estimators::TruthEstimator;
use crate::index::{AnswerIndex, Tally};

#[derive(Debug, Clone)]
pub struct Crh {
    params: CrhParams,
}

impl Crh {
    pub fn new(params: CrhParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CrhParams {
        &self.params
    }
}

impl TruthEstimator for Crh {
    type Output = WeightedVotingResult;

    fn algorithm(&self) -> Algorithm {
        Algorithm::Crh
    }

    fn estimate(&self, index: &AnswerIndex) -> WeightedVotingResult {
        let span = info_span!(
            "crh",
            answers = index.len(),
            iteration = field::Empty,
            delta = field::Empty,
            converged = field::Empty,
        );
        let _guard = span.enter();

        let params = &self.params;
        let tally = Tally::from_index(index);
        let settings = VotingLoop {
            convergence_threshold: params.convergence_threshold,
            max_iterations: params.max_iterations,
            parallel: params.parallel,
        };

        let result = run_weighted_vote(&tally, &settings, Algorithm::Crh, |truth| {
            let losses: Vec<f64> = (0..tally.participants.len())
                .map(|p| f64::from(mismatches(&tally, truth, p)).max(params.loss_floor))
                .collect();
            loss_weights(&losses, params.log_epsilon)
        });

        result.convergence.record(&span);
        info!(
            iterations = result.convergence.iterations,
            converged = result.convergence.converged,
            "crh complete"
        );
        result
    }
}

/// Map floored losses to weights. `losses` must be strictly positive.
fn loss_weights(losses: &[f64], epsilon: f64) -> Vec<f64> {
    let max = losses.iter().copied().fold(0.0_f64, f64::max);
    losses
        .iter()
        .map(|&loss| -(loss / max + epsilon).ln() + epsilon)
        .collect()
}
