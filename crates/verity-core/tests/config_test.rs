//! Tests for the Verity configuration system.

use std::sync::Mutex;

use verity_core::config::{ConfigOverrides, VerityConfig};
use verity_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all VERITY_ env vars to prevent cross-test contamination.
fn clear_verity_env_vars() {
    for key in [
        "VERITY_CONVERGENCE_THRESHOLD",
        "VERITY_MAX_ITERATIONS",
        "VERITY_CATD_ALPHA",
        "VERITY_CRH_LOSS_FLOOR",
        "VERITY_HYBRID_SWITCH_DELTA",
        "VERITY_CROWDTRUTH_DELTA",
        "VERITY_MAJORITY_AGREEMENT_THRESHOLD",
        "VERITY_PARALLEL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("verity.toml"),
        r#"
[inference]
max_iterations = 50
catd_alpha = 0.1
crowdtruth_delta = 0.01
"#,
    )
    .unwrap();

    std::env::set_var("VERITY_CATD_ALPHA", "0.2");
    std::env::set_var("VERITY_MAX_ITERATIONS", "60");

    let overrides = ConfigOverrides {
        max_iterations: Some(70),
        ..Default::default()
    };
    let config = VerityConfig::load(dir.path(), Some(&overrides)).unwrap();

    // Overrides beat env, env beats the project file, the file beats defaults.
    assert_eq!(config.inference.max_iterations, Some(70));
    assert_eq!(config.inference.catd_alpha, Some(0.2));
    assert_eq!(config.inference.crowdtruth_delta, Some(0.01));
    assert_eq!(config.inference.effective_convergence_threshold(), 1e-5);

    clear_verity_env_vars();
}

#[test]
fn test_load_without_project_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    let config = VerityConfig::load(dir.path(), None).unwrap();
    assert_eq!(config, VerityConfig::default());
    assert_eq!(config.inference.effective_max_iterations(), 100);
    assert_eq!(config.inference.effective_hybrid_switch_delta(), 0.05);
    assert_eq!(config.inference.effective_crowdtruth_max_iterations(), 1000);
}

#[test]
fn test_env_parallel_flag() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    std::env::set_var("VERITY_PARALLEL", "false");
    let config = VerityConfig::load(dir.path(), None).unwrap();
    assert!(!config.inference.effective_parallel());

    clear_verity_env_vars();
}

#[test]
fn test_majority_agreement_threshold_layers() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("verity.toml"),
        "[inference]\nmajority_agreement_threshold = 0.9\n",
    )
    .unwrap();
    let config = VerityConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.inference.effective_majority_agreement_threshold(), 0.9);

    std::env::set_var("VERITY_MAJORITY_AGREEMENT_THRESHOLD", "0.5");
    let config = VerityConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.inference.effective_majority_agreement_threshold(), 0.5);

    let overrides = ConfigOverrides {
        majority_agreement_threshold: Some(0.25),
        ..Default::default()
    };
    let config = VerityConfig::load(dir.path(), Some(&overrides)).unwrap();
    assert_eq!(config.inference.effective_majority_agreement_threshold(), 0.25);

    clear_verity_env_vars();
}

#[test]
fn test_unparsable_env_value_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    std::env::set_var("VERITY_MAX_ITERATIONS", "lots");
    let result = VerityConfig::load(dir.path(), None);
    match result {
        Err(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "VERITY_MAX_ITERATIONS");
        }
        other => panic!("Expected InvalidValue, got: {:?}", other),
    }

    clear_verity_env_vars();
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_verity_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("verity.toml"), "this is not valid toml {{{{").unwrap();

    match VerityConfig::load(dir.path(), None).unwrap_err() {
        ConfigError::ParseError { path, .. } => assert!(path.ends_with("verity.toml")),
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_validation_rejects_out_of_range_values() {
    let config = VerityConfig::from_toml("[inference]\ncatd_alpha = 1.5\n").unwrap();
    match VerityConfig::validate(&config).unwrap_err() {
        ConfigError::ValidationFailed { field, .. } => assert_eq!(field, "inference.catd_alpha"),
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }

    let config = VerityConfig::from_toml("[inference]\nmax_iterations = 0\n").unwrap();
    assert!(matches!(
        VerityConfig::validate(&config),
        Err(ConfigError::ValidationFailed { .. })
    ));

    let config = VerityConfig::from_toml("[inference]\nmajority_agreement_threshold = 1.2\n").unwrap();
    match VerityConfig::validate(&config).unwrap_err() {
        ConfigError::ValidationFailed { field, .. } => {
            assert_eq!(field, "inference.majority_agreement_threshold")
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }

    let config = VerityConfig::from_toml("[inference]\nconvergence_threshold = -1.0\n").unwrap();
    assert!(matches!(
        VerityConfig::validate(&config),
        Err(ConfigError::ValidationFailed { .. })
    ));
}

#[test]
fn test_toml_round_trip() {
    let config = VerityConfig::from_toml(
        r#"
[inference]
convergence_threshold = 0.0001
parallel = false
"#,
    )
    .unwrap();
    let text = config.to_toml().unwrap();
    let back = VerityConfig::from_toml(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config = VerityConfig::from_toml("[inference]\nfuture_knob = 3\n[reporting]\nformat = \"csv\"\n");
    assert!(config.is_ok());
}
