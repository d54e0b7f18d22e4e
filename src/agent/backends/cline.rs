//! Cline CLI adapter.
//!
//! Runs `cline -y -F plain --oneshot <prompt>`: auto-confirm, plain-text
//! output, single task without the interactive loop. Cline picks its model
//! from `cline auth` and rejects a per-task `model` setting, so the request's
//! model is ignored.

use crate::agent::backend::{BackendAdapter, BackendKind, BackendSettings};
use crate::agent::dispatch::{CommandLine, LaunchPlan};
use crate::agent::invocation::InvocationRequest;
use crate::agent::probe;
use crate::error::Result;
use std::time::Duration;

/// Cline tends to take longer on complex tasks.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

pub const PROBE_ARGS: &[&str] = &["version"];

pub struct ClineBackend {
    settings: BackendSettings,
}

impl ClineBackend {
    /// Probe the binary, then build the adapter.
    pub fn new(settings: BackendSettings) -> Result<Self> {
        probe::check_available(
            BackendKind::Cline.name(),
            &settings.binary,
            PROBE_ARGS,
            settings.probe_timeout,
        )?;
        Ok(Self::without_probe(settings))
    }

    /// Build the adapter without checking the binary, for dry runs.
    pub fn without_probe(settings: BackendSettings) -> Self {
        Self { settings }
    }
}

impl BackendAdapter for ClineBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cline
    }

    fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn command_line(&self, request: &InvocationRequest) -> CommandLine {
        if let Some(model) = request.model() {
            tracing::debug!(model, "cline does not support per-call model selection, ignoring");
        }
        CommandLine::new(&self.settings.binary)
            .args(["-y", "-F", "plain", "--oneshot"])
            .arg(&request.prompt)
    }

    fn launch_plan(&self, request: &InvocationRequest) -> LaunchPlan {
        self.settings.plan(request, self.command_line(request), None)
    }
}
