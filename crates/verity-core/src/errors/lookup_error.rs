//! Unknown-key errors raised by lookups against estimator results.
//!
//! A key that never appeared in the answer set is an upstream data bug, so
//! lookups fail fast instead of defaulting.

use super::error_code::{self, VerityErrorCode};
use crate::types::{ChoiceId, ParticipantId, QuestionId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Unknown question: {0}")]
    UnknownQuestion(QuestionId),

    #[error("Unknown choice: {0}")]
    UnknownChoice(ChoiceId),
}

impl VerityErrorCode for LookupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownParticipant(_) => error_code::UNKNOWN_PARTICIPANT,
            Self::UnknownQuestion(_) => error_code::UNKNOWN_QUESTION,
            Self::UnknownChoice(_) => error_code::UNKNOWN_CHOICE,
        }
    }
}
