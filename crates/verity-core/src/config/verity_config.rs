//! Top-level Verity configuration with layered resolution.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::InferenceConfig;
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;

/// Top-level configuration.
///
/// Resolution order (highest priority first):
/// 1. Caller overrides (applied via `apply_overrides`)
/// 2. Environment variables (`VERITY_*`)
/// 3. Project config (`verity.toml` in the given root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct VerityConfig {
    pub inference: InferenceConfig,
}

/// Caller-supplied overrides, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub convergence_threshold: Option<f64>,
    pub max_iterations: Option<usize>,
    pub catd_alpha: Option<f64>,
    pub hybrid_switch_delta: Option<f64>,
    pub majority_agreement_threshold: Option<f64>,
    pub parallel: Option<bool>,
}

impl VerityConfig {
    /// Load configuration with layered resolution and validate the result.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3: project config
        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): caller overrides
        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &VerityConfig) -> Result<(), ConfigError> {
        let inference = &config.inference;
        let positive = [
            ("inference.convergence_threshold", inference.convergence_threshold),
            ("inference.catd_error_epsilon", inference.catd_error_epsilon),
            ("inference.crh_loss_floor", inference.crh_loss_floor),
            ("inference.crh_log_epsilon", inference.crh_log_epsilon),
            ("inference.hybrid_switch_delta", inference.hybrid_switch_delta),
            ("inference.crowdtruth_delta", inference.crowdtruth_delta),
        ];
        for (field, value) in positive {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ConfigError::ValidationFailed {
                        field: field.to_string(),
                        message: "must be a finite number greater than 0".to_string(),
                    });
                }
            }
        }
        if let Some(alpha) = inference.catd_alpha {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(ConfigError::ValidationFailed {
                    field: "inference.catd_alpha".to_string(),
                    message: "must be strictly between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(threshold) = inference.majority_agreement_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationFailed {
                    field: "inference.majority_agreement_threshold".to_string(),
                    message: "must be between 0.0 and 1.0 inclusive".to_string(),
                });
            }
        }
        if inference.max_iterations == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "inference.max_iterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if inference.crowdtruth_max_iterations == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "inference.crowdtruth_max_iterations".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut VerityConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: VerityConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.inference.merge(&file_config.inference);
        Ok(())
    }

    /// Apply environment variable overrides.
    /// An unparsable value is rejected rather than ignored.
    fn apply_env_overrides(config: &mut VerityConfig) -> Result<(), ConfigError> {
        let inference = &mut config.inference;
        if let Some(v) = env_value("VERITY_CONVERGENCE_THRESHOLD")? {
            inference.convergence_threshold = Some(v);
        }
        if let Some(v) = env_value("VERITY_MAX_ITERATIONS")? {
            inference.max_iterations = Some(v);
        }
        if let Some(v) = env_value("VERITY_CATD_ALPHA")? {
            inference.catd_alpha = Some(v);
        }
        if let Some(v) = env_value("VERITY_CRH_LOSS_FLOOR")? {
            inference.crh_loss_floor = Some(v);
        }
        if let Some(v) = env_value("VERITY_HYBRID_SWITCH_DELTA")? {
            inference.hybrid_switch_delta = Some(v);
        }
        if let Some(v) = env_value("VERITY_CROWDTRUTH_DELTA")? {
            inference.crowdtruth_delta = Some(v);
        }
        if let Some(v) = env_value("VERITY_MAJORITY_AGREEMENT_THRESHOLD")? {
            inference.majority_agreement_threshold = Some(v);
        }
        if let Some(v) = env_value("VERITY_PARALLEL")? {
            inference.parallel = Some(v);
        }
        Ok(())
    }

    /// Apply caller overrides (highest priority).
    fn apply_overrides(config: &mut VerityConfig, overrides: &ConfigOverrides) {
        let inference = &mut config.inference;
        if let Some(v) = overrides.convergence_threshold {
            inference.convergence_threshold = Some(v);
        }
        if let Some(v) = overrides.max_iterations {
            inference.max_iterations = Some(v);
        }
        if let Some(v) = overrides.catd_alpha {
            inference.catd_alpha = Some(v);
        }
        if let Some(v) = overrides.hybrid_switch_delta {
            inference.hybrid_switch_delta = Some(v);
        }
        if let Some(v) = overrides.majority_agreement_threshold {
            inference.majority_agreement_threshold = Some(v);
        }
        if let Some(v) = overrides.parallel {
            inference.parallel = Some(v);
        }
    }
}

/// Read and parse one environment variable. Unset means `None`.
fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}
