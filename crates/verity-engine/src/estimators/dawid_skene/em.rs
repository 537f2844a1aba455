//! Dawid-Skene expectation-maximization over a dense tally.
//!
//! Each iteration is an M-step (class priors and per-participant confusion
//! matrices from the current label table) followed by an E-step (a new
//! label table from those parameters). The E-step works in log space and
//! renormalizes with log-sum-exp, so long answer lists do not underflow.

use std::collections::BTreeMap;

use tracing::{debug, field, info, info_span};
use verity_core::errors::InferenceError;
use verity_core::ChoiceId;

use super::types::{DawidSkeneParams, DawidSkeneResult, EmMode, ErrorRates};
use crate::algorithm::Algorithm;
use crate::convergence::{abs_delta, argmax_index, Convergence};
use crate::estimators::majority::majority_labels;
use crate::estimators::TruthEstimator;
use crate::index::{AnswerIndex, Tally};
use crate::parallel::map_range;

#[derive(Debug, Clone)]
pub struct DawidSkene {
    params: DawidSkeneParams,
}

/// One iteration's parameters and the label table they produced.
#[derive(Debug, Clone)]
struct Snapshot {
    priors: Vec<f64>,
    /// `[participant][truth][answered]`, flattened.
    error_rates: Vec<f64>,
    labels: Vec<Vec<f64>>,
}

impl DawidSkene {
    pub fn new(params: DawidSkeneParams) -> Result<Self, InferenceError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DawidSkeneParams {
        &self.params
    }
}

impl TruthEstimator for DawidSkene {
    type Output = DawidSkeneResult;

    fn algorithm(&self) -> Algorithm {
        match self.params.mode {
            EmMode::Full => Algorithm::DawidSkene,
            EmMode::Fast => Algorithm::FastDawidSkene,
            EmMode::Hybrid { .. } => Algorithm::HybridDawidSkene,
        }
    }

    fn estimate(&self, index: &AnswerIndex) -> DawidSkeneResult {
        let span = info_span!(
            "dawid_skene",
            algorithm = %self.algorithm(),
            answers = index.len(),
            iteration = field::Empty,
            delta = field::Empty,
            converged = field::Empty,
        );
        let _guard = span.enter();

        let params = &self.params;
        let tally = Tally::from_index(index);
        if tally.is_empty() {
            return DawidSkeneResult::empty(params.mode);
        }

        let mut labels = initial_labels(&tally, params.mode == EmMode::Fast);
        let mut classify = params.mode == EmMode::Fast;
        let mut switched_at = None;
        let mut log_likelihood = Vec::new();
        let mut previous: Option<Snapshot> = None;
        let mut iteration = 0;

        let (snapshot, convergence) = loop {
            iteration += 1;

            let priors = class_priors(&tally, &labels);
            let error_rates = confusion_matrices(&tally, &labels, params.parallel);
            let (mut next_labels, ll) = expectation(&tally, &priors, &error_rates, params.parallel);
            if classify {
                harden(&mut next_labels);
            }
            debug!(iteration, log_likelihood = ll, "dawid-skene iteration");
            log_likelihood.push(ll);

            labels = next_labels.clone();
            let current = Snapshot {
                priors,
                error_rates,
                labels: next_labels,
            };

            let Some(prev) = previous.take() else {
                if iteration >= params.max_iterations {
                    break (current, capped(iteration, f64::INFINITY));
                }
                previous = Some(current);
                continue;
            };

            let prior_delta = abs_delta(&prev.priors, &current.priors);
            let error_delta = abs_delta(&prev.error_rates, &current.error_rates);
            let delta = prior_delta.min(error_delta);
            debug!(iteration, prior_delta, error_delta, "dawid-skene deltas");

            // The reported estimate is the one the new iteration was compared
            // against, not the new iteration itself.
            if delta < params.convergence_threshold {
                break (
                    prev,
                    Convergence {
                        iterations: iteration,
                        converged: true,
                        final_delta: delta,
                    },
                );
            }
            if let EmMode::Hybrid { switch_delta } = params.mode {
                if !classify && error_delta < switch_delta {
                    classify = true;
                    switched_at = Some(iteration);
                    debug!(iteration, error_delta, "switching to classification steps");
                }
            }
            if iteration >= params.max_iterations {
                break (prev, capped(iteration, delta));
            }
            previous = Some(current);
        };

        convergence.record(&span);
        info!(
            iterations = convergence.iterations,
            converged = convergence.converged,
            "dawid-skene complete"
        );

        build_result(&tally, params.mode, snapshot, log_likelihood, switched_at, convergence)
    }
}

fn capped(iterations: usize, final_delta: f64) -> Convergence {
    Convergence {
        iterations,
        converged: false,
        final_delta,
    }
}

/// Empirical choice frequencies per question, or their one-hot argmax.
fn initial_labels(tally: &Tally, hard: bool) -> Vec<Vec<f64>> {
    if hard {
        let majority = majority_labels(tally);
        return majority
            .into_iter()
            .map(|winner| one_hot(tally.choices.len(), winner))
            .collect();
    }
    (0..tally.questions.len())
        .map(|q| {
            let counts = tally.choice_counts(q);
            let total: u32 = counts.iter().sum();
            counts
                .into_iter()
                .map(|n| f64::from(n) / f64::from(total))
                .collect()
        })
        .collect()
}

fn one_hot(len: usize, hot: usize) -> Vec<f64> {
    let mut row = vec![0.0; len];
    row[hot] = 1.0;
    row
}

/// Replace every row with the one-hot vector of its argmax.
fn harden(labels: &mut [Vec<f64>]) {
    for row in labels.iter_mut() {
        if let Some(best) = argmax_index(row) {
            let len = row.len();
            *row = one_hot(len, best);
        }
    }
}

/// `p[j]`: mean label mass of choice `j` over all questions.
fn class_priors(tally: &Tally, labels: &[Vec<f64>]) -> Vec<f64> {
    let mut priors = vec![0.0; tally.choices.len()];
    for row in labels {
        for (j, mass) in row.iter().enumerate() {
            priors[j] += mass;
        }
    }
    let questions = labels.len() as f64;
    priors.iter_mut().for_each(|p| *p /= questions);
    priors
}

/// `pi[k][j][l]`: label-weighted share of participant `k`'s answers equal to
/// `l` on questions whose true choice is `j`. Zero rows when the participant
/// has no mass on `j`.
fn confusion_matrices(tally: &Tally, labels: &[Vec<f64>], parallel: bool) -> Vec<f64> {
    let c = tally.choices.len();
    let blocks = map_range(tally.participants.len(), parallel, |k| {
        let mut block = vec![0.0; c * c];
        let mut denominators = vec![0.0; c];
        for response in &tally.by_participant[k] {
            let n = f64::from(response.count);
            for (j, mass) in labels[response.question].iter().enumerate() {
                let weight = mass * n;
                block[j * c + response.choice] += weight;
                denominators[j] += weight;
            }
        }
        for (j, denominator) in denominators.iter().enumerate() {
            let row = &mut block[j * c..(j + 1) * c];
            if *denominator > 0.0 {
                row.iter_mut().for_each(|v| *v /= denominator);
            }
        }
        block
    });
    blocks.concat()
}

/// New label table and the log-likelihood of the current parameters.
fn expectation(
    tally: &Tally,
    priors: &[f64],
    error_rates: &[f64],
    parallel: bool,
) -> (Vec<Vec<f64>>, f64) {
    let c = tally.choices.len();
    let rows = map_range(tally.questions.len(), parallel, |q| {
        let mut logs: Vec<f64> = priors.iter().map(|p| p.ln()).collect();
        for response in &tally.by_question[q] {
            let n = f64::from(response.count);
            let base = response.participant * c * c;
            for (j, log) in logs.iter_mut().enumerate() {
                *log += n * error_rates[base + j * c + response.choice].ln();
            }
        }
        normalize_log(logs)
    });

    // Sequential, in question order, so the sum is reproducible.
    let mut log_likelihood = 0.0;
    let mut labels = Vec::with_capacity(rows.len());
    for (row, evidence) in rows {
        if let Some(evidence) = evidence {
            log_likelihood += evidence;
        }
        labels.push(row);
    }
    (labels, log_likelihood)
}

/// Exponentiate and normalize log scores. Returns the distribution and
/// `ln(sum of exp(log))`, or a uniform row and `None` when every score is
/// zero.
fn normalize_log(logs: Vec<f64>) -> (Vec<f64>, Option<f64>) {
    let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        let uniform = 1.0 / logs.len() as f64;
        return (vec![uniform; logs.len()], None);
    }
    let scaled: Vec<f64> = logs.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = scaled.iter().sum();
    let row = scaled.into_iter().map(|v| v / sum).collect();
    (row, Some(max + sum.ln()))
}

fn build_result(
    tally: &Tally,
    mode: EmMode,
    snapshot: Snapshot,
    log_likelihood: Vec<f64>,
    switched_at: Option<usize>,
    convergence: Convergence,
) -> DawidSkeneResult {
    let c = tally.choices.len();

    let label_probabilities = tally
        .questions
        .iter()
        .zip(&snapshot.labels)
        .map(|(question, row)| (question.clone(), keyed_row(tally, row)))
        .collect();

    let class_priors = keyed_row(tally, &snapshot.priors);

    let mut error_rates: ErrorRates = BTreeMap::new();
    for (k, participant) in tally.participants.iter().enumerate() {
        let rows = tally
            .choices
            .iter()
            .enumerate()
            .map(|(j, truth)| {
                let start = (k * c + j) * c;
                (truth.clone(), keyed_row(tally, &snapshot.error_rates[start..start + c]))
            })
            .collect();
        error_rates.insert(participant.clone(), rows);
    }

    DawidSkeneResult {
        mode,
        label_probabilities,
        class_priors,
        error_rates,
        log_likelihood,
        switched_at,
        convergence,
    }
}

fn keyed_row(tally: &Tally, row: &[f64]) -> BTreeMap<ChoiceId, f64> {
    tally.choices.iter().cloned().zip(row.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_core::{Answer, QuestionId};

    fn two_raters() -> AnswerIndex {
        AnswerIndex::new(vec![
            Answer::new("r1", "q1", "yes"),
            Answer::new("r2", "q1", "yes"),
            Answer::new("r1", "q2", "no"),
            Answer::new("r2", "q2", "no"),
            Answer::new("r1", "q3", "yes"),
            Answer::new("r2", "q3", "no"),
        ])
    }

    #[test]
    fn test_normalize_log_uniform_fallback() {
        let (row, evidence) = normalize_log(vec![f64::NEG_INFINITY; 4]);
        assert_eq!(row, vec![0.25; 4]);
        assert!(evidence.is_none());
    }

    #[test]
    fn test_normalize_log_matches_linear() {
        let (row, evidence) = normalize_log(vec![0.2f64.ln(), 0.6f64.ln()]);
        assert!((row[0] - 0.25).abs() < 1e-12);
        assert!((row[1] - 0.75).abs() < 1e-12);
        assert!((evidence.unwrap() - 0.8f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_rows_sum_to_one() {
        let index = two_raters();
        let result = DawidSkene::new(DawidSkeneParams::default())
            .unwrap()
            .estimate(&index);
        for rows in result.error_rates.values() {
            for row in rows.values() {
                let sum: f64 = row.values().sum();
                assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9, "row sum {}", sum);
            }
        }
    }

    #[test]
    fn test_unanimous_questions_are_certain() {
        let index = two_raters();
        let result = DawidSkene::new(DawidSkeneParams::default())
            .unwrap()
            .estimate(&index);
        let (choice, p) = result.most_likely(&QuestionId::new("q1")).unwrap();
        assert_eq!(choice.as_str(), "yes");
        assert!(p > 0.99);
    }

    #[test]
    fn test_single_iteration_cap_returns_first_estimate() {
        let params = DawidSkeneParams {
            max_iterations: 1,
            ..Default::default()
        };
        let result = DawidSkene::new(params).unwrap().estimate(&two_raters());
        assert_eq!(result.convergence.iterations, 1);
        assert!(!result.convergence.converged);
        assert_eq!(result.log_likelihood.len(), 1);
    }

    #[test]
    fn test_fast_mode_rows_are_one_hot() {
        let params = DawidSkeneParams::default().with_mode(EmMode::Fast);
        let result = DawidSkene::new(params).unwrap().estimate(&two_raters());
        for row in result.label_probabilities.values() {
            let ones = row.values().filter(|&&p| p == 1.0).count();
            let zeros = row.values().filter(|&&p| p == 0.0).count();
            assert_eq!((ones, zeros), (1, row.len() - 1));
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = DawidSkeneParams {
            convergence_threshold: 0.0,
            ..Default::default()
        };
        assert!(DawidSkene::new(params).is_err());
        let params = DawidSkeneParams::default().with_mode(EmMode::Hybrid { switch_delta: -1.0 });
        assert!(DawidSkene::new(params).is_err());
    }
}
