//! Tests for the Verity tracing setup.

use std::sync::Mutex;

use verity_core::tracing::{fields, init_tracing};

/// Serializes tests that touch `VERITY_LOG`.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_verity_log_debug() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("VERITY_LOG", "debug");
    init_tracing();
    std::env::remove_var("VERITY_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_verity_log_fallback() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("VERITY_LOG", "this_is_garbage=not_a_level");
    init_tracing();
    std::env::remove_var("VERITY_LOG");
}

#[test]
fn test_field_names_are_unique() {
    let names = [
        fields::ITERATION,
        fields::DELTA,
        fields::CONVERGED,
    ];
    let unique: std::collections::HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}
