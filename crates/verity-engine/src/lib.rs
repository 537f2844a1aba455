//! # verity-engine
//!
//! Truth inference over crowd answers: an index of `(participant, question,
//! choice)` triples, and estimators that turn it into a truth estimate and
//! per-participant scores.
//!
//! Estimators: Dawid-Skene EM (full, fast, hybrid), CATD, CRH, ZenCrowd,
//! CrowdTruth, plain and adaptive majority voting. Each run is synchronous,
//! reads the index only, and returns a fresh result.

pub mod algorithm;
pub mod convergence;
pub mod decision;
pub mod estimators;
pub mod index;
mod parallel;

pub use algorithm::Algorithm;
pub use convergence::Convergence;
pub use decision::{run_algorithm, Decision, EstimatorOutput};
pub use estimators::TruthEstimator;
pub use index::AnswerIndex;
