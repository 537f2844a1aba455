//! Answer-Index: the shared read-only structure every estimator consumes.

pub mod answer_index;
pub mod tally;

pub use answer_index::{AnswerIndex, AnswerIter};
pub use tally::{Response, Tally};
