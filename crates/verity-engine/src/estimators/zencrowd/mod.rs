//! Per-participant scalar reliability (Demartini et al., 2012).

pub mod em;
pub mod types;

pub use em::ZenCrowd;
pub use types::{ZenCrowdParams, ZenCrowdResult};
