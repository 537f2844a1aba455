//! Confusion-matrix EM estimator (Dawid & Skene, 1979) with the fast and
//! hybrid schedules of Sinha et al. (2018).

pub mod em;
pub mod types;

pub use em::DawidSkene;
pub use types::{DawidSkeneParams, DawidSkeneResult, EmMode, ErrorRates};
