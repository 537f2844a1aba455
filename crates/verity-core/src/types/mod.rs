//! Identifiers and the answer triple.

pub mod answer;
pub mod identifiers;

pub use answer::Answer;
pub use identifiers::{ChoiceId, ParticipantId, QuestionId};
