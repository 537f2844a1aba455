//! Confidence-aware truth discovery.
//!
//! A source's weight is the lower `alpha / 2` chi-squared quantile for its
//! number of answers, divided by its mismatch count. Sources with many
//! answers earn a tighter confidence bound and therefore more weight for the
//! same error rate. Weights are normalized to sum to 1 every iteration.

use std::collections::BTreeMap;

use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::{field, info, info_span};
use verity_core::errors::InferenceError;

use super::types::{CatdParams, WeightedVotingResult};
use super::{mismatches, run_weighted_vote, VotingLoop};
use crate::algorithm::Algorithm;
use crate::estimators::TruthEstimator;
use crate::index::{AnswerIndex, Tally};

#[derive(Debug, Clone)]
pub struct Catd {
    params: CatdParams,
}

impl Catd {
    pub fn new(params: CatdParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CatdParams {
        &self.params
    }
}

impl TruthEstimator for Catd {
    type Output = WeightedVotingResult;

    fn algorithm(&self) -> Algorithm {
        Algorithm::Catd
    }

    fn estimate(&self, index: &AnswerIndex) -> WeightedVotingResult {
        let span = info_span!(
            "catd",
            answers = index.len(),
            iteration = field::Empty,
            delta = field::Empty,
            converged = field::Empty,
        );
        let _guard = span.enter();

        let params = &self.params;
        let tally = Tally::from_index(index);

        // Answer counts never change, so each quantile is computed once.
        let mut by_dof: BTreeMap<u32, f64> = BTreeMap::new();
        let quantiles: Vec<f64> = (0..tally.participants.len())
            .map(|p| {
                let dof = tally.answer_count(p);
                *by_dof
                    .entry(dof)
                    .or_insert_with(|| chi_squared_quantile(dof, params.alpha / 2.0))
            })
            .collect();

        let settings = VotingLoop {
            convergence_threshold: params.convergence_threshold,
            max_iterations: params.max_iterations,
            parallel: params.parallel,
        };
        let result = run_weighted_vote(&tally, &settings, Algorithm::Catd, |truth| {
            let raw: Vec<f64> = quantiles
                .iter()
                .enumerate()
                .map(|(p, quantile)| {
                    let errors = f64::from(mismatches(&tally, truth, p));
                    quantile / (errors + params.error_epsilon)
                })
                .collect();
            normalize(raw)
        });

        result.convergence.record(&span);
        info!(
            iterations = result.convergence.iterations,
            converged = result.convergence.converged,
            "catd complete"
        );
        result
    }
}

/// Lower `p` quantile of the chi-squared distribution with `dof` degrees of
/// freedom. Zero degrees of freedom is the point mass at 0.
///
/// `inverse_cdf` loses precision (and returns NaN) far in the lower tail of
/// small `dof`, so its answer is only kept when the CDF confirms it;
/// otherwise the quantile is found by bisection on the CDF.
pub fn chi_squared_quantile(dof: u32, p: f64) -> f64 {
    if dof == 0 || p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let dist = match ChiSquared::new(f64::from(dof)) {
        Ok(dist) => dist,
        Err(_) => return 0.0,
    };
    let direct = dist.inverse_cdf(p);
    if direct.is_finite() && direct >= 0.0 && (dist.cdf(direct) - p).abs() <= QUANTILE_TOLERANCE * p
    {
        return direct;
    }
    bisect_quantile(&dist, p)
}

const QUANTILE_TOLERANCE: f64 = 1e-9;
const BISECTION_STEPS: usize = 200;

fn bisect_quantile(dist: &ChiSquared, p: f64) -> f64 {
    let mut lo = 0.0_f64;
    let mut hi = dist.freedom().max(1.0);
    while hi.is_finite() && dist.cdf(hi) < p {
        hi *= 2.0;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if dist.cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Scale to sum 1; uniform when the total is zero or not finite.
fn normalize(raw: Vec<f64>) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    if total > 0.0 && total.is_finite() {
        raw.into_iter().map(|w| w / total).collect()
    } else {
        let uniform = 1.0 / raw.len() as f64;
        vec![uniform; raw.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chi_squared_quantile_known_values() {
        // Reference values of the chi-squared quantile at p = 0.025.
        assert!((chi_squared_quantile(1, 0.025) - 0.000982).abs() < 1e-5);
        assert!((chi_squared_quantile(10, 0.025) - 3.2470).abs() < 1e-3);
        assert!((chi_squared_quantile(45, 0.025) - 28.366).abs() < 1e-2);
    }

    #[test]
    fn test_chi_squared_quantile_degenerate_dof() {
        assert_eq!(chi_squared_quantile(0, 0.025), 0.0);
    }

    #[test]
    fn test_chi_squared_quantile_lower_tail_is_positive() {
        for dof in 1..=8 {
            let q = chi_squared_quantile(dof, 0.025);
            assert!(q.is_finite() && q > 0.0, "dof {} gave {}", dof, q);
            let dist = ChiSquared::new(f64::from(dof)).unwrap();
            assert!((dist.cdf(q) - 0.025).abs() < 1e-6, "dof {}", dof);
        }
    }

    #[test]
    fn test_chi_squared_quantile_bisection_matches_known_value() {
        let dist = ChiSquared::new(1.0).unwrap();
        assert!((bisect_quantile(&dist, 0.025) - 0.000982).abs() < 1e-5);
    }

    #[test]
    fn test_chi_squared_quantile_probability_bounds() {
        assert_eq!(chi_squared_quantile(3, 0.0), 0.0);
        assert_eq!(chi_squared_quantile(3, 1.0), f64::INFINITY);
    }

    #[test]
    fn test_normalize_uniform_fallback() {
        assert_eq!(normalize(vec![0.0, 0.0]), vec![0.5, 0.5]);
        let w = normalize(vec![1.0, 3.0]);
        assert!((w[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_out_of_range() {
        let params = CatdParams {
            alpha: 1.0,
            ..Default::default()
        };
        assert!(Catd::new(params).is_err());
    }
}
