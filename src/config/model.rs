//! Config struct definition and default implementation.

use super::types::BackendOverrides;
use crate::agent::BackendKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "agentrun.yaml";

/// Configuration for agentrun.
///
/// This struct represents the contents of `agentrun.yaml`. Every field is
/// optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend used by `run` when `--backend` is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<BackendKind>,

    /// Deadline for availability probes, in seconds.
    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,

    /// Per-backend overrides. Keys must be known backend names.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub backends: BTreeMap<BackendKind, BackendOverrides>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_probe_timeout_seconds() -> u64 {
    crate::agent::DEFAULT_PROBE_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_backend: None,
            probe_timeout_seconds: default_probe_timeout_seconds(),
            backends: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}
