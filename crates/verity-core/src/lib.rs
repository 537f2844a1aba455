//! Core types, errors, configuration, tracing, and constants shared by every
//! Verity crate.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use types::{Answer, ChoiceId, ParticipantId, QuestionId};
