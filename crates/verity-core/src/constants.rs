//! Shared constants for the Verity inference engine.

/// Default summed-absolute-change threshold for the EM and weighted-voting loops.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-5;

/// Default iteration cap for the EM and weighted-voting loops.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default CATD chi-squared confidence level.
pub const DEFAULT_CATD_ALPHA: f64 = 0.05;

/// Added to a CATD source's mismatch count before division.
pub const DEFAULT_CATD_ERROR_EPSILON: f64 = 1e-9;

/// Raw mismatch sum substituted for a CRH source with no disagreements.
pub const DEFAULT_CRH_LOSS_FLOOR: f64 = 1e-8;

/// Offset inside and outside the CRH log weight.
pub const DEFAULT_CRH_LOG_EPSILON: f64 = 1e-7;

/// Error-rate movement under which the hybrid Dawid-Skene switches to hard assignments.
pub const DEFAULT_HYBRID_SWITCH_DELTA: f64 = 0.05;

/// Per-score stability threshold for the CrowdTruth fixed point.
pub const DEFAULT_CROWDTRUTH_DELTA: f64 = 0.001;

/// Iteration cap for the CrowdTruth fixed point.
pub const DEFAULT_CROWDTRUTH_MAX_ITERATIONS: usize = 1000;

/// Agreement share under which adaptive majority voting drops a participant.
pub const DEFAULT_MAJORITY_AGREEMENT_THRESHOLD: f64 = 0.1;

/// Initial per-participant reliability for ZenCrowd.
pub const ZENCROWD_INITIAL_RELIABILITY: f64 = 0.5;

/// Two probabilities closer than this are treated as tied when deciding.
pub const PROBABILITY_TIE_TOLERANCE: f64 = 1e-12;

/// Project config file name looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "verity.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "VERITY_LOG";
