use std::collections::BTreeMap;

use serde::Serialize;
use verity_core::config::InferenceConfig;
use verity_core::constants::{DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS};
use verity_core::errors::{InferenceError, LookupError};
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use crate::convergence::{argmax, Convergence};
use crate::estimators::{check_iterations, check_positive};

#[derive(Debug, Clone, PartialEq)]
pub struct ZenCrowdParams {
    pub convergence_threshold: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

impl Default for ZenCrowdParams {
    fn default() -> Self {
        Self {
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl ZenCrowdParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            convergence_threshold: config.effective_convergence_threshold(),
            max_iterations: config.effective_max_iterations(),
            parallel: config.effective_parallel(),
        }
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        check_positive("convergence_threshold", self.convergence_threshold)?;
        check_iterations("max_iterations", self.max_iterations)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZenCrowdResult {
    /// Per question, a probability for every choice in the answer set.
    pub label_probabilities: BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>>,
    /// Probability that a participant's answer is the true choice.
    pub reliabilities: BTreeMap<ParticipantId, f64>,
    pub convergence: Convergence,
}

impl ZenCrowdResult {
    pub(crate) fn empty() -> Self {
        Self {
            label_probabilities: BTreeMap::new(),
            reliabilities: BTreeMap::new(),
            convergence: Convergence::empty(),
        }
    }

    pub fn reliability_of(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        self.reliabilities
            .get(participant)
            .copied()
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))
    }

    pub fn most_likely(&self, question: &QuestionId) -> Option<(ChoiceId, f64)> {
        let row = self.label_probabilities.get(question)?;
        argmax(row.iter().map(|(c, p)| (c.clone(), *p)))
    }
}
