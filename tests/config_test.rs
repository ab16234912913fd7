//! Integration tests for Settings loading.
//!
//! Precedence: defaults < global < local file < BTSEARCH_* environment.
//! These tests use explicit temp files and assume no global config and no
//! BTSEARCH_* variables in the test environment.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use btsearch::application::ApplicationError;
use btsearch::config::Settings;
use btsearch::domain::ScanStrategy;

#[test]
fn given_partial_config_file_when_load_then_overrides_only_given_keys() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("btsearch.toml");
    let content = r#"
max_value = 50

[search]
strategy = "memoized"
"#;
    fs::write(&path, content).unwrap();

    // Act
    let settings = Settings::load(Some(path.as_path())).expect("load settings");

    // Assert
    assert_eq!(settings.max_value, 50);
    assert_eq!(settings.search.strategy, ScanStrategy::Memoized);
    assert_eq!(settings.render_limit, 100);
    assert_eq!(settings.generate.none_probability, 0.2);
    assert_eq!(
        settings.generate.autosave,
        Some(PathBuf::from("generated_tree.txt"))
    );
    assert_eq!(settings.bound().unwrap().max(), 50);
}

#[test]
fn given_empty_autosave_when_load_then_autosave_disabled() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("btsearch.toml");
    fs::write(&path, "[generate]\nautosave = \"\"\n").unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();

    assert_eq!(settings.generate.autosave, None);
}

#[test]
fn given_missing_explicit_file_when_load_then_file_not_found() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nope.toml");

    let result = Settings::load(Some(path.as_path()));

    assert!(matches!(result, Err(ApplicationError::FileNotFound(p)) if p == path));
}

#[test]
fn given_invalid_values_when_load_then_config_error() {
    let temp = TempDir::new().unwrap();
    let zero_max = temp.path().join("zero.toml");
    fs::write(&zero_max, "max_value = 0\n").unwrap();
    let bad_probability = temp.path().join("prob.toml");
    fs::write(&bad_probability, "[generate]\nnone_probability = 1.5\n").unwrap();

    assert!(matches!(
        Settings::load(Some(zero_max.as_path())),
        Err(ApplicationError::Config { .. })
    ));
    assert!(matches!(
        Settings::load(Some(bad_probability.as_path())),
        Err(ApplicationError::Config { .. })
    ));
}

#[test]
fn given_malformed_toml_when_load_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    fs::write(&path, "max_value = [not toml").unwrap();

    let result = Settings::load(Some(path.as_path()));

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("parse")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn given_template_when_written_and_loaded_then_equals_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("btsearch.toml");
    fs::write(&path, Settings::template().unwrap()).unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();

    assert_eq!(settings, Settings::default());
}
