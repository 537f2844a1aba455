//! Dawid-Skene parameters and result types.

use std::collections::BTreeMap;

use serde::Serialize;
use verity_core::config::InferenceConfig;
use verity_core::constants::{
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_HYBRID_SWITCH_DELTA, DEFAULT_MAX_ITERATIONS,
};
use verity_core::errors::{InferenceError, LookupError};
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use crate::convergence::{argmax, Convergence};
use crate::estimators::{check_iterations, check_positive};

/// Update schedule for the label table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmMode {
    /// Classic soft EM from empirical frequencies.
    #[default]
    Full,
    /// Hard majority initialization, then a classification step (argmax to
    /// a one-hot row) after every E-step.
    Fast,
    /// Full EM until the summed error-rate movement between two iterations
    /// drops under `switch_delta`, then classification steps from there on.
    Hybrid { switch_delta: f64 },
}

impl EmMode {
    pub fn hybrid() -> Self {
        Self::Hybrid {
            switch_delta: DEFAULT_HYBRID_SWITCH_DELTA,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DawidSkeneParams {
    pub mode: EmMode,
    /// Stop once the prior or error-rate movement is below this.
    pub convergence_threshold: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

impl Default for DawidSkeneParams {
    fn default() -> Self {
        Self {
            mode: EmMode::Full,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl DawidSkeneParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            mode: EmMode::Full,
            convergence_threshold: config.effective_convergence_threshold(),
            max_iterations: config.effective_max_iterations(),
            parallel: config.effective_parallel(),
        }
    }

    /// Hybrid parameters with the configured switch threshold.
    pub fn hybrid_from_config(config: &InferenceConfig) -> Self {
        Self::from_config(config).with_mode(EmMode::Hybrid {
            switch_delta: config.effective_hybrid_switch_delta(),
        })
    }

    pub fn with_mode(mut self, mode: EmMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        check_positive("convergence_threshold", self.convergence_threshold)?;
        check_iterations("max_iterations", self.max_iterations)?;
        if let EmMode::Hybrid { switch_delta } = self.mode {
            check_positive("hybrid_switch_delta", switch_delta)?;
        }
        Ok(())
    }
}

/// Participant -> true choice -> answered choice -> probability.
///
/// Each `(participant, true choice)` row sums to 1 over answered choices,
/// or is all zeros when the model never assigns that true choice mass on the
/// participant's questions.
pub type ErrorRates = BTreeMap<ParticipantId, BTreeMap<ChoiceId, BTreeMap<ChoiceId, f64>>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DawidSkeneResult {
    pub mode: EmMode,
    /// Per question, a probability for every choice; each row sums to 1.
    pub label_probabilities: BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>>,
    pub class_priors: BTreeMap<ChoiceId, f64>,
    pub error_rates: ErrorRates,
    /// Diagnostic log-likelihood of every executed iteration.
    pub log_likelihood: Vec<f64>,
    /// Hybrid mode: iteration after which classification steps began.
    pub switched_at: Option<usize>,
    pub convergence: Convergence,
}

impl DawidSkeneResult {
    pub(crate) fn empty(mode: EmMode) -> Self {
        Self {
            mode,
            label_probabilities: BTreeMap::new(),
            class_priors: BTreeMap::new(),
            error_rates: BTreeMap::new(),
            log_likelihood: Vec::new(),
            switched_at: None,
            convergence: Convergence::empty(),
        }
    }

    /// Probability that `participant` answers `answered` when the true choice is `truth`.
    pub fn error_rate(
        &self,
        participant: &ParticipantId,
        answered: &ChoiceId,
        truth: &ChoiceId,
    ) -> Result<f64, LookupError> {
        let rows = self
            .error_rates
            .get(participant)
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))?;
        let row = rows
            .get(truth)
            .ok_or_else(|| LookupError::UnknownChoice(truth.clone()))?;
        row.get(answered)
            .copied()
            .ok_or_else(|| LookupError::UnknownChoice(answered.clone()))
    }

    /// Probability that the participant reports the true choice, averaged
    /// over the class priors.
    pub fn accuracy(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        let rows = self
            .error_rates
            .get(participant)
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))?;
        Ok(self
            .class_priors
            .iter()
            .map(|(choice, prior)| {
                let correct = rows
                    .get(choice)
                    .and_then(|row| row.get(choice))
                    .copied()
                    .unwrap_or(0.0);
                prior * correct
            })
            .sum())
    }

    /// Most probable choice for a question.
    pub fn most_likely(&self, question: &QuestionId) -> Option<(ChoiceId, f64)> {
        let row = self.label_probabilities.get(question)?;
        argmax(row.iter().map(|(c, p)| (c.clone(), *p)))
    }
}
