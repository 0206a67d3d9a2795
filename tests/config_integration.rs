//! Configuration system integration tests.
//!
//! Exercises load, save, and migration against real files in a temporary
//! directory, so the user's actual config is never touched.

use orator::config::{self, Config};
use tempfile::TempDir;

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.server.base_url = "http://coach.internal:8000".to_string();
    config.server.timeout_secs = 45;
    config.audio.device_id = Some("USB Microphone".to_string());
    config.general.log_to_file = false;

    config::save_to(&config, &path).expect("Failed to save config");
    let restored = config::load_from(&path).expect("Failed to load config");

    assert_eq!(restored.server.base_url, "http://coach.internal:8000");
    assert_eq!(restored.server.timeout_secs, 45);
    assert_eq!(restored.audio.device_id, Some("USB Microphone".to_string()));
    assert!(!restored.general.log_to_file);
}

#[test]
fn test_load_missing_file_yields_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("does_not_exist.json");

    let config = config::load_from(&path).expect("Missing file should yield defaults");
    assert_eq!(config.server.base_url, "http://localhost:8000");
    assert_eq!(config.audio.sample_rate, 16000);
}

#[test]
fn test_load_corrupt_file_errors() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let result = config::load_from(&path);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to parse config"));
}

#[test]
fn test_save_creates_parent_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("deeper").join("config.json");

    config::save_to(&Config::default(), &path).expect("Failed to save config");
    assert!(path.exists());
}

#[test]
fn test_version_0_file_migrates_on_load() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"version": 0, "server": {"base_url": "http://old-host:8000"}}"#,
    )
    .unwrap();

    let config = config::load_from(&path).expect("Migration should succeed");
    assert_eq!(config.version, Config::default().version);
    // Migration preserves the user's settings
    assert_eq!(config.server.base_url, "http://old-host:8000");
}

#[test]
fn test_future_version_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"version": 999}"#).unwrap();

    let result = config::load_from(&path);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown config version"));
}

#[test]
fn test_saved_file_is_pretty_printed_json() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    config::save_to(&Config::default(), &path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();

    // Human-editable: multi-line with indentation
    assert!(contents.lines().count() > 1);
    assert!(contents.contains("\"base_url\""));
}
