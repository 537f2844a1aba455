//! CATD / CRH parameters and the shared point-estimate result.

use std::collections::BTreeMap;

use serde::Serialize;
use verity_core::config::InferenceConfig;
use verity_core::constants::*;
use verity_core::errors::{InferenceError, LookupError};
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use crate::algorithm::Algorithm;
use crate::convergence::Convergence;
use crate::estimators::{check_iterations, check_positive};

#[derive(Debug, Clone, PartialEq)]
pub struct CatdParams {
    /// Chi-squared confidence level; the quantile is taken at `alpha / 2`.
    pub alpha: f64,
    /// Added to a source's mismatch count before dividing.
    pub error_epsilon: f64,
    pub convergence_threshold: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

impl Default for CatdParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_CATD_ALPHA,
            error_epsilon: DEFAULT_CATD_ERROR_EPSILON,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl CatdParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            alpha: config.effective_catd_alpha(),
            error_epsilon: config.effective_catd_error_epsilon(),
            convergence_threshold: config.effective_convergence_threshold(),
            max_iterations: config.effective_max_iterations(),
            parallel: config.effective_parallel(),
        }
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(InferenceError::invalid(
                "catd_alpha",
                format!("must be strictly between 0 and 1, got {}", self.alpha),
            ));
        }
        check_positive("catd_error_epsilon", self.error_epsilon)?;
        check_positive("convergence_threshold", self.convergence_threshold)?;
        check_iterations("max_iterations", self.max_iterations)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrhParams {
    /// Mismatch sum substituted for a source that never disagrees.
    pub loss_floor: f64,
    /// Offset inside and outside the log of the normalized loss.
    pub log_epsilon: f64,
    pub convergence_threshold: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

impl Default for CrhParams {
    fn default() -> Self {
        Self {
            loss_floor: DEFAULT_CRH_LOSS_FLOOR,
            log_epsilon: DEFAULT_CRH_LOG_EPSILON,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl CrhParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            loss_floor: config.effective_crh_loss_floor(),
            log_epsilon: config.effective_crh_log_epsilon(),
            convergence_threshold: config.effective_convergence_threshold(),
            max_iterations: config.effective_max_iterations(),
            parallel: config.effective_parallel(),
        }
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        check_positive("crh_loss_floor", self.loss_floor)?;
        check_positive("crh_log_epsilon", self.log_epsilon)?;
        check_positive("convergence_threshold", self.convergence_threshold)?;
        check_iterations("max_iterations", self.max_iterations)
    }
}

/// Point estimate produced by CATD or CRH.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedVotingResult {
    pub algorithm: Algorithm,
    pub truth: BTreeMap<QuestionId, ChoiceId>,
    /// Final source weights. CATD weights sum to 1; CRH weights are unnormalized.
    pub weights: BTreeMap<ParticipantId, f64>,
    /// Weighted vote totals behind `truth`, for every observed choice.
    pub vote_scores: BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>>,
    pub convergence: Convergence,
}

impl WeightedVotingResult {
    pub(crate) fn empty(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            truth: BTreeMap::new(),
            weights: BTreeMap::new(),
            vote_scores: BTreeMap::new(),
            convergence: Convergence::empty(),
        }
    }

    pub fn weight_of(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        self.weights
            .get(participant)
            .copied()
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))
    }

    pub fn truth_for(&self, question: &QuestionId) -> Result<&ChoiceId, LookupError> {
        self.truth
            .get(question)
            .ok_or_else(|| LookupError::UnknownQuestion(question.clone()))
    }
}
