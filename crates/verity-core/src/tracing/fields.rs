//! Structured field names recorded on estimator spans once a run finishes.
//!
//! Every estimator records its convergence under the same names so one
//! filter or query covers all algorithm families.

/// Number of iterations the run performed.
pub const ITERATION: &str = "iteration";

/// Final change compared against the convergence threshold.
pub const DELTA: &str = "delta";

/// Whether the run stopped on its threshold rather than its iteration cap.
pub const CONVERGED: &str = "converged";
