//! The `Answer` triple consumed by every estimator.

use serde::{Deserialize, Serialize};

use super::identifiers::{ChoiceId, ParticipantId, QuestionId};

/// "This participant selected this choice for this question."
///
/// Repeated annotations are allowed: several answers may share the same
/// `(participant, question)` pair, and many participants may pick the same
/// `(question, choice)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Answer {
    pub participant: ParticipantId,
    pub question: QuestionId,
    pub choice: ChoiceId,
}

impl Answer {
    pub fn new(
        participant: impl Into<ParticipantId>,
        question: impl Into<QuestionId>,
        choice: impl Into<ChoiceId>,
    ) -> Self {
        Self {
            participant: participant.into(),
            question: question.into(),
            choice: choice.into(),
        }
    }
}
