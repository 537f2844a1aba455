//! One output type for every estimator family, and the mapping from an
//! output to a final per-question decision.

use std::collections::BTreeMap;

use serde::Serialize;
use verity_core::config::InferenceConfig;
use verity_core::constants::PROBABILITY_TIE_TOLERANCE;
use verity_core::errors::{InferenceError, LookupError};
use verity_core::{ChoiceId, ParticipantId, QuestionId};

use crate::algorithm::Algorithm;
use crate::estimators::{
    AdaptiveMajorityParams, AdaptiveMajorityResult, AdaptiveMajorityVote, Catd, CatdParams, Crh,
    CrhParams, CrowdTruth, CrowdTruthParams, CrowdTruthResult, DawidSkene, DawidSkeneParams,
    DawidSkeneResult, EmMode, MajorityResult, MajorityVote, TaskKind, TruthEstimator,
    WeightedVotingResult, ZenCrowd, ZenCrowdParams, ZenCrowdResult,
};
use crate::index::AnswerIndex;

/// Result of any estimator, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", content = "result", rename_all = "snake_case")]
pub enum EstimatorOutput {
    DawidSkene(DawidSkeneResult),
    Catd(WeightedVotingResult),
    Crh(WeightedVotingResult),
    ZenCrowd(ZenCrowdResult),
    CrowdTruth(CrowdTruthResult),
    Majority(MajorityResult),
    AdaptiveMajority(AdaptiveMajorityResult),
}

/// Final answer for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    Decided { choice: ChoiceId, score: f64 },
    /// Two or more choices share the top score. Sorted by choice.
    Undecidable { tied: Vec<ChoiceId> },
}

impl Decision {
    pub fn choice(&self) -> Option<&ChoiceId> {
        match self {
            Self::Decided { choice, .. } => Some(choice),
            Self::Undecidable { .. } => None,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Decided { .. })
    }
}

impl EstimatorOutput {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::DawidSkene(result) => match result.mode {
                EmMode::Full => Algorithm::DawidSkene,
                EmMode::Fast => Algorithm::FastDawidSkene,
                EmMode::Hybrid { .. } => Algorithm::HybridDawidSkene,
            },
            Self::Catd(_) => Algorithm::Catd,
            Self::Crh(_) => Algorithm::Crh,
            Self::ZenCrowd(_) => Algorithm::ZenCrowd,
            Self::CrowdTruth(result) => match result.task {
                TaskKind::Closed => Algorithm::CrowdtruthClosed,
                TaskKind::Open => Algorithm::CrowdtruthOpen,
            },
            Self::Majority(_) => Algorithm::Majority,
            Self::AdaptiveMajority(_) => Algorithm::AdaptiveMajority,
        }
    }

    fn score_table(&self) -> &BTreeMap<QuestionId, BTreeMap<ChoiceId, f64>> {
        match self {
            Self::DawidSkene(result) => &result.label_probabilities,
            Self::Catd(result) | Self::Crh(result) => &result.vote_scores,
            Self::ZenCrowd(result) => &result.label_probabilities,
            Self::CrowdTruth(result) => &result.clarity,
            Self::Majority(result) => &result.label_distribution,
            Self::AdaptiveMajority(result) => &result.majority.label_distribution,
        }
    }

    /// Every scored choice of a question, sorted by choice: probabilities,
    /// weighted vote totals, clarity scores or vote shares depending on the
    /// family.
    pub fn question_scores(&self, question: &QuestionId) -> Option<Vec<(ChoiceId, f64)>> {
        self.score_table()
            .get(question)
            .map(|row| row.iter().map(|(c, s)| (c.clone(), *s)).collect())
    }

    /// Decision for every question the estimator scored.
    pub fn decisions(&self) -> BTreeMap<QuestionId, Decision> {
        let tolerance = self.tie_tolerance();
        self.score_table()
            .iter()
            .filter_map(|(question, row)| {
                decide(row, tolerance).map(|decision| (question.clone(), decision))
            })
            .collect()
    }

    pub fn decision_for(&self, question: &QuestionId) -> Result<Decision, LookupError> {
        self.score_table()
            .get(question)
            .and_then(|row| decide(row, self.tie_tolerance()))
            .ok_or_else(|| LookupError::UnknownQuestion(question.clone()))
    }

    /// The family's per-participant score: expected accuracy under
    /// Dawid-Skene, source weight for CATD and CRH, reliability for
    /// ZenCrowd, worker quality for CrowdTruth and agreement with the
    /// majority for both majority votes. A participant dropped by the
    /// adaptive vote keeps the agreement it was dropped with.
    pub fn participant_score(&self, participant: &ParticipantId) -> Result<f64, LookupError> {
        match self {
            Self::DawidSkene(result) => result.accuracy(participant),
            Self::Catd(result) | Self::Crh(result) => result.weight_of(participant),
            Self::ZenCrowd(result) => result.reliability_of(participant),
            Self::CrowdTruth(result) => result.participant_quality_of(participant),
            Self::Majority(result) => result.agreement_of(participant),
            Self::AdaptiveMajority(result) => result.agreement_of(participant),
        }
    }

    fn tie_tolerance(&self) -> f64 {
        if self.algorithm().is_probabilistic() {
            PROBABILITY_TIE_TOLERANCE
        } else {
            0.0
        }
    }
}

fn decide(row: &BTreeMap<ChoiceId, f64>, tolerance: f64) -> Option<Decision> {
    let top = row.values().copied().fold(f64::NEG_INFINITY, f64::max);
    if !top.is_finite() {
        return None;
    }
    let mut tied: Vec<ChoiceId> = row
        .iter()
        .filter(|&(_, &score)| top - score <= tolerance)
        .map(|(choice, _)| choice.clone())
        .collect();
    if tied.len() == 1 {
        let choice = tied.remove(0);
        Some(Decision::Decided { choice, score: top })
    } else {
        Some(Decision::Undecidable { tied })
    }
}

impl From<DawidSkeneResult> for EstimatorOutput {
    fn from(result: DawidSkeneResult) -> Self {
        Self::DawidSkene(result)
    }
}

impl From<WeightedVotingResult> for EstimatorOutput {
    fn from(result: WeightedVotingResult) -> Self {
        match result.algorithm {
            Algorithm::Crh => Self::Crh(result),
            _ => Self::Catd(result),
        }
    }
}

impl From<ZenCrowdResult> for EstimatorOutput {
    fn from(result: ZenCrowdResult) -> Self {
        Self::ZenCrowd(result)
    }
}

impl From<CrowdTruthResult> for EstimatorOutput {
    fn from(result: CrowdTruthResult) -> Self {
        Self::CrowdTruth(result)
    }
}

impl From<MajorityResult> for EstimatorOutput {
    fn from(result: MajorityResult) -> Self {
        Self::Majority(result)
    }
}

impl From<AdaptiveMajorityResult> for EstimatorOutput {
    fn from(result: AdaptiveMajorityResult) -> Self {
        Self::AdaptiveMajority(result)
    }
}

/// Build the named estimator from `config` and run it.
///
/// CrowdTruth runs here use the observed choices as the closed vocabulary;
/// build a `CrowdTruth` directly to supply a larger one.
pub fn run_algorithm(
    algorithm: Algorithm,
    index: &AnswerIndex,
    config: &InferenceConfig,
) -> Result<EstimatorOutput, InferenceError> {
    let output = match algorithm {
        Algorithm::DawidSkene => DawidSkene::new(DawidSkeneParams::from_config(config))?
            .estimate(index)
            .into(),
        Algorithm::FastDawidSkene => {
            DawidSkene::new(DawidSkeneParams::from_config(config).with_mode(EmMode::Fast))?
                .estimate(index)
                .into()
        }
        Algorithm::HybridDawidSkene => {
            DawidSkene::new(DawidSkeneParams::hybrid_from_config(config))?
                .estimate(index)
                .into()
        }
        Algorithm::Catd => EstimatorOutput::Catd(
            Catd::new(CatdParams::from_config(config))?.estimate(index),
        ),
        Algorithm::Crh => {
            EstimatorOutput::Crh(Crh::new(CrhParams::from_config(config))?.estimate(index))
        }
        Algorithm::ZenCrowd => ZenCrowd::new(ZenCrowdParams::from_config(config))?
            .estimate(index)
            .into(),
        Algorithm::CrowdtruthClosed => CrowdTruth::new(CrowdTruthParams::from_config(config))?
            .estimate(index)
            .into(),
        Algorithm::CrowdtruthOpen => {
            CrowdTruth::new(CrowdTruthParams::from_config(config).with_task(TaskKind::Open))?
                .estimate(index)
                .into()
        }
        Algorithm::Majority => MajorityVote.estimate(index).into(),
        Algorithm::AdaptiveMajority => {
            AdaptiveMajorityVote::new(AdaptiveMajorityParams::from_config(config))?
                .estimate(index)
                .into()
        }
    };
    tracing::debug!(algorithm = %algorithm, "estimator run finished");
    Ok(output)
}
