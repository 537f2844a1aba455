use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use verity_core::config::InferenceConfig;
use verity_core::constants::{DEFAULT_CROWDTRUTH_DELTA, DEFAULT_CROWDTRUTH_MAX_ITERATIONS};
use verity_core::errors::{InferenceError, LookupError};
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use crate::convergence::{argmax, Convergence};
use crate::estimators::{check_iterations, check_positive};

/// Whether the annotation vocabulary is fixed up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Every question offers the same choices; choice quality is estimated.
    #[default]
    Closed,
    /// Free-form answers; choice quality is held at 1.0 and not reported.
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrowdTruthParams {
    pub task: TaskKind,
    /// Closed tasks only: choices offered to participants that nobody may
    /// have picked. Unioned with the observed choices.
    pub vocabulary: Vec<ChoiceId>,
    /// Stop once no score moves by this much or more.
    pub delta: f64,
    pub max_iterations: usize,
    pub parallel: bool,
}

impl Default for CrowdTruthParams {
    fn default() -> Self {
        Self {
            task: TaskKind::Closed,
            vocabulary: Vec::new(),
            delta: DEFAULT_CROWDTRUTH_DELTA,
            max_iterations: DEFAULT_CROWDTRUTH_MAX_ITERATIONS,
            parallel: true,
        }
    }
}

impl CrowdTruthParams {
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self {
            delta: config.effective_crowdtruth_delta(),
            max_iterations: config.effective_crowdtruth_max_iterations(),
            parallel: config.effective_parallel(),
            ..Default::default()
        }
    }

    pub fn with_task(mut self, task: TaskKind) -> Self {
        self.task = task;
        self
    }

    pub fn with_vocabulary<I, C>(mut self, vocabulary: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChoiceId>,
    {
        self.vocabulary = vocabulary.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        check_positive("crowdtruth_delta", self.delta)?;
        check_iterations("crowdtruth_max_iterations", self.max_iterations)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrowdTruthResult {
    pub task: TaskKind,
    /// Empty for open tasks.
    pub choice_quality: BTreeMap<ChoiceId, f64>,
    pub participant_quality: BTreeMap<ParticipantId, f64>,
    pub question_quality: BTreeMap<QuestionId, f64>,
    /// Reliability-weighted share of participants picking each choice.
    pub clarity: BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>>,
    pub convergence: Convergence,
}

impl CrowdTruthResult {
    pub(crate) fn empty(task: TaskKind) -> Self {
        Self {
            task,
            choice_quality: BTreeMap::new(),
            participant_quality: BTreeMap::new(),
            question_quality: BTreeMap::new(),
            clarity: BTreeMap::new(),
            convergence: Convergence::empty(),
        }
    }

    pub fn participant_quality_of(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        self.participant_quality
            .get(participant)
            .copied()
            .ok_or_else(|| LookupError::UnknownParticipant(participant.clone()))
    }

    pub fn question_quality_of(&self, question: &QuestionId) -> Result<f64, LookupError> {
        self.question_quality
            .get(question)
            .copied()
            .ok_or_else(|| LookupError::UnknownQuestion(question.clone()))
    }

    pub fn clarity_of(&self, question: &QuestionId, choice: &ChoiceId) -> Result<f64, LookupError> {
        let row = self
            .clarity
            .get(question)
            .ok_or_else(|| LookupError::UnknownQuestion(question.clone()))?;
        row.get(choice)
            .copied()
            .ok_or_else(|| LookupError::UnknownChoice(choice.clone()))
    }

    /// The `n` participants with the highest quality. Equal scores go to
    /// the smaller id.
    pub fn highest_quality(&self, n: usize) -> BTreeSet<ParticipantId> {
        self.ranked(n, |a, b| b.total_cmp(a))
    }

    /// The `n` participants with the lowest quality. Equal scores go to the
    /// smaller id.
    pub fn lowest_quality(&self, n: usize) -> BTreeSet<ParticipantId> {
        self.ranked(n, |a, b| a.total_cmp(b))
    }

    fn ranked<F>(&self, n: usize, order: F) -> BTreeSet<ParticipantId>
    where
        F: Fn(&f64, &f64) -> Ordering,
    {
        let mut scored: Vec<(&ParticipantId, &f64)> = self.participant_quality.iter().collect();
        // Stable sort over id-ordered input keeps ties in id order.
        scored.sort_by(|a, b| order(a.1, b.1));
        scored.into_iter().take(n).map(|(p, _)| p.clone()).collect()
    }

    /// Highest-clarity choice of a question.
    pub fn clearest(&self, question: &QuestionId) -> Option<(ChoiceId, f64)> {
        let row = self.clarity.get(question)?;
        argmax(row.iter().map(|(c, s)| (c.clone(), *s)))
    }
}
