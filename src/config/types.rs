//! Per-backend configuration entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overrides for one backend under `backends:`.
///
/// ```yaml
/// backends:
///   codex:
///     binary: /opt/codex/bin/codex
///     timeout_seconds: 900
///     environment:
///       CODEX_HOME: /srv/codex
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOverrides {
    /// Executable to run instead of the backend's name on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Invocation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Environment variables merged into the agent process environment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}
