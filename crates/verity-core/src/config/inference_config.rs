//! Inference configuration.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Tunables shared by every estimator. Unset fields fall back to the
/// compiled defaults through the `effective_*` accessors.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Summed absolute change that stops EM / weighted voting. Default: 1e-5.
    pub convergence_threshold: Option<f64>,
    /// Iteration cap for EM / weighted voting. Default: 100.
    pub max_iterations: Option<usize>,
    /// CATD chi-squared confidence level. Default: 0.05.
    pub catd_alpha: Option<f64>,
    /// CATD mismatch offset. Default: 1e-9.
    pub catd_error_epsilon: Option<f64>,
    /// CRH zero-loss floor. Default: 1e-8.
    pub crh_loss_floor: Option<f64>,
    /// CRH log offset. Default: 1e-7.
    pub crh_log_epsilon: Option<f64>,
    /// Hybrid Dawid-Skene switch threshold. Default: 0.05.
    pub hybrid_switch_delta: Option<f64>,
    /// CrowdTruth per-score stability threshold. Default: 0.001.
    pub crowdtruth_delta: Option<f64>,
    /// CrowdTruth iteration cap. Default: 1000.
    pub crowdtruth_max_iterations: Option<usize>,
    /// Adaptive majority voting drop threshold, in `[0, 1]`. Default: 0.1.
    pub majority_agreement_threshold: Option<f64>,
    /// Parallelize per-question / per-participant updates. Default: true.
    pub parallel: Option<bool>,
}

impl InferenceConfig {
    pub fn effective_convergence_threshold(&self) -> f64 {
        self.convergence_threshold
            .unwrap_or(DEFAULT_CONVERGENCE_THRESHOLD)
    }

    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS)
    }

    pub fn effective_catd_alpha(&self) -> f64 {
        self.catd_alpha.unwrap_or(DEFAULT_CATD_ALPHA)
    }

    pub fn effective_catd_error_epsilon(&self) -> f64 {
        self.catd_error_epsilon.unwrap_or(DEFAULT_CATD_ERROR_EPSILON)
    }

    pub fn effective_crh_loss_floor(&self) -> f64 {
        self.crh_loss_floor.unwrap_or(DEFAULT_CRH_LOSS_FLOOR)
    }

    pub fn effective_crh_log_epsilon(&self) -> f64 {
        self.crh_log_epsilon.unwrap_or(DEFAULT_CRH_LOG_EPSILON)
    }

    pub fn effective_hybrid_switch_delta(&self) -> f64 {
        self.hybrid_switch_delta
            .unwrap_or(DEFAULT_HYBRID_SWITCH_DELTA)
    }

    pub fn effective_crowdtruth_delta(&self) -> f64 {
        self.crowdtruth_delta.unwrap_or(DEFAULT_CROWDTRUTH_DELTA)
    }

    pub fn effective_crowdtruth_max_iterations(&self) -> usize {
        self.crowdtruth_max_iterations
            .unwrap_or(DEFAULT_CROWDTRUTH_MAX_ITERATIONS)
    }

    pub fn effective_majority_agreement_threshold(&self) -> f64 {
        self.majority_agreement_threshold
            .unwrap_or(DEFAULT_MAJORITY_AGREEMENT_THRESHOLD)
    }

    pub fn effective_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Overwrite every field `other` sets.
    pub(crate) fn merge(&mut self, other: &InferenceConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field;
                    }
                )*
            };
        }
        take!(
            convergence_threshold,
            max_iterations,
            catd_alpha,
            catd_error_epsilon,
            crh_loss_floor,
            crh_log_epsilon,
            hybrid_switch_delta,
            crowdtruth_delta,
            crowdtruth_max_iterations,
            majority_agreement_threshold,
            parallel
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.effective_convergence_threshold(), 1e-5);
        assert_eq!(config.effective_max_iterations(), 100);
        assert_eq!(config.effective_catd_alpha(), 0.05);
        assert_eq!(config.effective_crh_loss_floor(), 1e-8);
        assert_eq!(config.effective_crowdtruth_delta(), 0.001);
        assert_eq!(config.effective_majority_agreement_threshold(), 0.1);
        assert!(config.effective_parallel());
    }

    #[test]
    fn test_merge_only_overwrites_set_fields() {
        let mut base = InferenceConfig {
            max_iterations: Some(10),
            catd_alpha: Some(0.1),
            ..Default::default()
        };
        let other = InferenceConfig {
            catd_alpha: Some(0.2),
            ..Default::default()
        };
        base.merge(&other);
        assert_eq!(base.max_iterations, Some(10));
        assert_eq!(base.catd_alpha, Some(0.2));
    }
}
