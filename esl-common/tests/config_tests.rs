//! Integration tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing config files do not cause failure (warning + defaults)
//! - Priority order for config path resolution (CLI > env > platform file)
//! - Invalid files are reported as configuration errors
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate ESL_PLAYER_CONFIG are marked with #[serial].

use esl_common::config::{resolve_config_path, ShadowingContinuation, TomlConfig, CONFIG_ENV_VAR};
use esl_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_load_none_uses_defaults() {
    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let config = TomlConfig::load(Some(Path::new("/nonexistent/esl/config.toml"))).unwrap();
    assert_eq!(config.playback.debounce_ms, 250);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_file_overrides_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[playback]
listen_advance_delay_ms = 3000
shadowing_delay_secs = 4.5
shadowing_continuation = "replay"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.playback.listen_advance_delay_ms, 3000);
    assert_eq!(config.playback.shadowing_delay_secs, 4.5);
    assert_eq!(config.playback.shadowing_continuation, ShadowingContinuation::Replay);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_malformed_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[playback\ndebounce_ms = ").unwrap();

    let err = TomlConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    let test_path = "/tmp/esl-test-env-config.toml";
    env::set_var(CONFIG_ENV_VAR, test_path);

    let resolved = resolve_config_path(None);

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from(test_path)));
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/esl-from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/esl-from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/esl-from-cli.toml")));
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);

    env::remove_var(CONFIG_ENV_VAR);
    // Falls through to the platform file, which only counts if it exists
    if let Some(path) = resolved {
        assert!(path.exists());
    }
}
