use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use quote_app::platform::config::{AppConfig, ConfigError, ConfigOverrides, API_URL_ENV, WS_URL_ENV};
use quote_app::platform::logging::LogDestination;
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn file_values_fill_in_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stealthquote.ron");
    fs::write(
        &path,
        r#"(api_url: "https://quotes.example.com/api", log_destination: both, request_timeout_secs: 5)"#,
    )
    .unwrap();

    let config = AppConfig::load(Some(&path), no_env).unwrap();
    assert_eq!(config.api_url, "https://quotes.example.com/api");
    assert_eq!(config.log_destination, LogDestination::Both);
    assert_eq!(config.request_timeout_secs, 5);
    assert_eq!(config.ws_url, AppConfig::default().ws_url);

    let settings = config.client_settings();
    assert_eq!(settings.request_timeout, Duration::from_secs(5));
    assert_eq!(settings.api_base_url, "https://quotes.example.com/api");
}

#[test]
fn environment_beats_file_and_flags_beat_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.ron");
    fs::write(&path, r#"(api_url: "http://file/api", ws_url: "ws://file/ws/{jobId}")"#).unwrap();

    let env = |key: &str| match key {
        API_URL_ENV => Some("http://env/api".to_string()),
        WS_URL_ENV => Some("ws://env/ws/{jobId}".to_string()),
        _ => None,
    };
    let config = AppConfig::load(Some(&path), env).unwrap();
    assert_eq!(config.api_url, "http://env/api");
    assert_eq!(config.ws_url, "ws://env/ws/{jobId}");

    let config = config.with_overrides(&ConfigOverrides {
        api_url: Some("http://flag/api".to_string()),
        output_dir: Some(PathBuf::from("exports")),
        ..ConfigOverrides::default()
    });
    assert_eq!(config.api_url, "http://flag/api");
    assert_eq!(config.ws_url, "ws://env/ws/{jobId}");
    assert_eq!(config.output_dir, PathBuf::from("exports"));
}

#[test]
fn blank_environment_values_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.ron");
    fs::write(&path, "()").unwrap();

    let env = |key: &str| (key == API_URL_ENV).then(|| "  ".to_string());
    let config = AppConfig::load(Some(&path), env).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::load(Some(&dir.path().join("nope.ron")), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.ron");
    fs::write(&path, "(api_url: 42").unwrap();
    let err = AppConfig::load(Some(&path), no_env).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn defaults_validate() {
    let config = AppConfig::default();
    assert_eq!(config.api_url, "http://localhost:3000/api");
    assert_eq!(config.ws_url, "ws://localhost:3000/ws/jobs/{jobId}");
    config.validate().unwrap();
}

#[test]
fn wrong_schemes_are_rejected() {
    let config = AppConfig {
        api_url: "ws://localhost:3000/api".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { field: "api_url", .. })
    ));

    let config = AppConfig {
        ws_url: "http://localhost:3000/ws/{jobId}".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { field: "ws_url", .. })
    ));

    let config = AppConfig {
        request_timeout_secs: 0,
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "request_timeout_secs",
            ..
        })
    ));
}
