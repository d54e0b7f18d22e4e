//! Config loading, validation, and settings resolution.

use super::model::{Config, DEFAULT_CONFIG_FILE};
use crate::agent::{BackendKind, BackendSettings};
use crate::error::{AgentrunError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentrunError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map(Some)
    }

    /// Resolve the config for a CLI invocation.
    ///
    /// An explicit path must exist. Without one, `agentrun.yaml` in the
    /// current directory is used if present, defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path)?.ok_or_else(|| {
                AgentrunError::UserError(format!("config file '{}' not found", path.display()))
            }),
            None => Ok(Self::load(DEFAULT_CONFIG_FILE)?.unwrap_or_default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AgentrunError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `probe_timeout_seconds` must be positive
    /// - per-backend `timeout_seconds` must be positive
    /// - per-backend `binary` must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout_seconds == 0 {
            return Err(AgentrunError::UserError(
                "config validation failed: probe_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (kind, overrides) in &self.backends {
            if overrides.timeout_seconds == Some(0) {
                return Err(AgentrunError::UserError(format!(
                    "config validation failed: backends.{}.timeout_seconds must be greater than 0",
                    kind
                )));
            }
            if let Some(binary) = &overrides.binary
                && binary.trim().is_empty()
            {
                return Err(AgentrunError::UserError(format!(
                    "config validation failed: backends.{}.binary must not be empty",
                    kind
                )));
            }
        }

        Ok(())
    }

    /// Effective settings for `kind`: `timeout_override` (seconds, from the
    /// CLI) beats the config file, which beats the backend's defaults.
    pub fn settings_for(&self, kind: BackendKind, timeout_override: Option<u64>) -> BackendSettings {
        let mut settings = BackendSettings::defaults(kind);
        settings.probe_timeout = Duration::from_secs(self.probe_timeout_seconds);

        if let Some(overrides) = self.backends.get(&kind) {
            if let Some(binary) = &overrides.binary {
                settings = settings.with_binary(binary);
            }
            if let Some(secs) = overrides.timeout_seconds {
                settings = settings.with_timeout(Duration::from_secs(secs));
            }
            settings.environment = overrides.environment.clone();
        }

        if let Some(secs) = timeout_override {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }

        settings
    }
}
