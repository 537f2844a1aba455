//! Convergence bookkeeping and the stable argmax shared by every estimator.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::Span;
use verity_core::tracing::fields;

/// How an iterative run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Convergence {
    /// Iterations executed, including the one that met the threshold.
    pub iterations: usize,
    /// `true` when the threshold was met, `false` when the cap stopped the run.
    pub converged: bool,
    /// Last delta compared against the threshold.
    pub final_delta: f64,
}

impl Convergence {
    /// Result for an empty answer set: nothing to iterate, trivially converged.
    pub fn empty() -> Self {
        Self {
            iterations: 0,
            converged: true,
            final_delta: 0.0,
        }
    }

    pub(crate) fn record(&self, span: &Span) {
        span.record(fields::ITERATION, self.iterations);
        span.record(fields::DELTA, self.final_delta);
        span.record(fields::CONVERGED, self.converged);
    }
}

/// Summed absolute difference between two keyed score maps. A key missing on
/// one side counts as 0 there.
pub fn sum_abs_delta<K: Ord>(prev: &BTreeMap<K, f64>, next: &BTreeMap<K, f64>) -> f64 {
    let mut total = 0.0;
    for (key, value) in next {
        total += (value - prev.get(key).copied().unwrap_or(0.0)).abs();
    }
    for (key, value) in prev {
        if !next.contains_key(key) {
            total += value.abs();
        }
    }
    total
}

/// Dense variant of `sum_abs_delta` over aligned slices.
pub(crate) fn abs_delta(prev: &[f64], next: &[f64]) -> f64 {
    prev.iter().zip(next).map(|(a, b)| (a - b).abs()).sum()
}

/// Largest single absolute difference over aligned slices.
pub(crate) fn max_abs_delta(prev: &[f64], next: &[f64]) -> f64 {
    prev.iter()
        .zip(next)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Highest score wins; among equal scores the smallest key wins.
///
/// Returns `None` for an empty input.
pub fn argmax<K: Ord, I>(scores: I) -> Option<(K, f64)>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let mut best: Option<(K, f64)> = None;
    for (key, score) in scores {
        best = match best {
            None => Some((key, score)),
            Some((best_key, best_score)) => {
                if score > best_score || (score == best_score && key < best_key) {
                    Some((key, score))
                } else {
                    Some((best_key, best_score))
                }
            }
        };
    }
    best
}

/// `argmax` over a dense score vector indexed by sorted keys: the first
/// maximum wins.
pub(crate) fn argmax_index(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some(b) if score <= scores[b] => {}
            _ => best = Some(i),
        }
    }
    best
}
