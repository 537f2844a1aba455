//! Configuration system for Verity.
//! TOML-based, layered resolution: overrides > env > project > defaults.

pub mod inference_config;
pub mod verity_config;

pub use inference_config::InferenceConfig;
pub use verity_config::{ConfigOverrides, VerityConfig};
