//! Truth estimators. Each consumes an `AnswerIndex` read-only and returns a
//! fresh, immutable result.

pub mod adaptive_majority;
pub mod crowdtruth;
pub mod dawid_skene;
pub mod majority;
pub mod weighted_voting;
pub mod zencrowd;

use verity_core::errors::InferenceError;

use crate::algorithm::Algorithm;
use crate::index::AnswerIndex;

pub use adaptive_majority::{AdaptiveMajorityParams, AdaptiveMajorityResult, AdaptiveMajorityVote};
pub use crowdtruth::{CrowdTruth, CrowdTruthParams, CrowdTruthResult, TaskKind};
pub use dawid_skene::{DawidSkene, DawidSkeneParams, DawidSkeneResult, EmMode};
pub use majority::{MajorityResult, MajorityVote};
pub use weighted_voting::{Catd, CatdParams, Crh, CrhParams, WeightedVotingResult};
pub use zencrowd::{ZenCrowd, ZenCrowdParams, ZenCrowdResult};

/// A truth-inference algorithm.
///
/// `estimate` never fails: sparse or degenerate input is handled by
/// substitution, and an empty index yields an empty result flagged as
/// converged. Parameter problems surface when the estimator is built.
pub trait TruthEstimator {
    type Output;

    fn algorithm(&self) -> Algorithm;

    fn estimate(&self, index: &AnswerIndex) -> Self::Output;
}

/// Shared parameter checks.
pub(crate) fn check_positive(name: &str, value: f64) -> Result<(), InferenceError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InferenceError::invalid(
            name,
            format!("must be a finite number greater than 0, got {value}"),
        ))
    }
}

pub(crate) fn check_iterations(name: &str, value: usize) -> Result<(), InferenceError> {
    if value == 0 {
        Err(InferenceError::invalid(name, "must be at least 1"))
    } else {
        Ok(())
    }
}
