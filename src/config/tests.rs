//! Tests for config functionality.

use crate::agent::{BackendKind, DEFAULT_PROBE_TIMEOUT};
use crate::config::{BackendOverrides, Config, DEFAULT_CONFIG_FILE};
use crate::test_support::DirGuard;
use serial_test::serial;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.default_backend, None);
    assert_eq!(config.probe_timeout_seconds, 5);
    assert!(config.backends.is_empty());
    assert!(config.extra.is_empty());
}

#[test]
fn test_parse_empty_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());

    let config = Config::from_yaml("   \n").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
default_backend: cline
probe_timeout_seconds: 10
backends:
  codex:
    binary: /opt/codex/bin/codex
    timeout_seconds: 900
    environment:
      CODEX_HOME: /srv/codex
  claude:
    timeout_seconds: 1200
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.default_backend, Some(BackendKind::Cline));
    assert_eq!(config.probe_timeout_seconds, 10);

    let codex = &config.backends[&BackendKind::Codex];
    assert_eq!(codex.binary.as_deref(), Some("/opt/codex/bin/codex"));
    assert_eq!(codex.timeout_seconds, Some(900));
    assert_eq!(codex.environment["CODEX_HOME"], "/srv/codex");

    let claude = &config.backends[&BackendKind::Claude];
    assert_eq!(claude.binary, None);
    assert_eq!(claude.timeout_seconds, Some(1200));
}

#[test]
fn test_unknown_fields_are_preserved() {
    let yaml = r#"
future_setting: true
backends:
  cline:
    sandbox: strict
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(config.extra.contains_key("future_setting"));
    assert!(config.backends[&BackendKind::Cline].extra.contains_key("sandbox"));

    let round_tripped = Config::from_yaml(&serde_yaml::to_string(&config).unwrap()).unwrap();
    assert_eq!(round_tripped, config);
}

#[test]
fn test_unknown_backend_is_rejected() {
    let yaml = r#"
backends:
  gemini:
    timeout_seconds: 60
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_zero_probe_timeout_is_rejected() {
    let err = Config::from_yaml("probe_timeout_seconds: 0").unwrap_err();
    assert!(err.to_string().contains("probe_timeout_seconds must be greater than 0"));
}

#[test]
fn test_zero_backend_timeout_is_rejected() {
    let yaml = r#"
backends:
  codex:
    timeout_seconds: 0
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("backends.codex.timeout_seconds"));
}

#[test]
fn test_empty_binary_is_rejected() {
    let yaml = r#"
backends:
  claude:
    binary: "  "
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("backends.claude.binary must not be empty"));
}

#[test]
fn test_settings_default_to_backend_policy() {
    let config = Config::default();

    let codex = config.settings_for(BackendKind::Codex, None);
    assert_eq!(codex.binary, "codex");
    assert_eq!(codex.timeout, Duration::from_secs(600));
    assert_eq!(codex.probe_timeout, DEFAULT_PROBE_TIMEOUT);

    let cline = config.settings_for(BackendKind::Cline, None);
    assert_eq!(cline.timeout, Duration::from_secs(1800));
}

#[test]
fn test_settings_precedence() {
    let mut config = Config {
        probe_timeout_seconds: 2,
        ..Config::default()
    };
    let mut overrides = BackendOverrides {
        binary: Some("/usr/local/bin/codex".to_string()),
        timeout_seconds: Some(900),
        ..BackendOverrides::default()
    };
    overrides
        .environment
        .insert("OPENAI_BASE_URL".to_string(), "http://localhost:8080".to_string());
    config.backends.insert(BackendKind::Codex, overrides);

    let from_file = config.settings_for(BackendKind::Codex, None);
    assert_eq!(from_file.binary, "/usr/local/bin/codex");
    assert_eq!(from_file.timeout, Duration::from_secs(900));
    assert_eq!(from_file.probe_timeout, Duration::from_secs(2));
    assert_eq!(from_file.environment["OPENAI_BASE_URL"], "http://localhost:8080");

    let from_cli = config.settings_for(BackendKind::Codex, Some(30));
    assert_eq!(from_cli.timeout, Duration::from_secs(30));

    // Other backends are unaffected.
    let cline = config.settings_for(BackendKind::Cline, None);
    assert_eq!(cline.binary, "cline");
}

#[test]
fn test_load_missing_file_returns_none() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load(temp_dir.path().join("agentrun.yaml")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_resolve_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.yaml");
    let err = Config::resolve(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_resolve_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.yaml");
    std::fs::write(&path, "default_backend: claude\n").unwrap();

    let config = Config::resolve(Some(&path)).unwrap();
    assert_eq!(config.default_backend, Some(BackendKind::Claude));
}

#[test]
#[serial]
fn test_resolve_uses_default_file_in_current_dir() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join(DEFAULT_CONFIG_FILE),
        "default_backend: codex\n",
    )
    .unwrap();

    let _guard = DirGuard::new(temp_dir.path());
    let config = Config::resolve(None).unwrap();
    assert_eq!(config.default_backend, Some(BackendKind::Codex));
}

#[test]
#[serial]
fn test_resolve_without_any_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();

    let _guard = DirGuard::new(temp_dir.path());
    let config = Config::resolve(None).unwrap();
    assert_eq!(config, Config::default());
}
