//! Codex CLI adapter.
//!
//! Runs `codex exec [--model M] --full-auto` and pipes the prompt through
//! stdin, which `codex exec` reads when no prompt argument is given.

use crate::agent::backend::{BackendAdapter, BackendKind, BackendSettings};
use crate::agent::dispatch::{CommandLine, LaunchPlan};
use crate::agent::invocation::InvocationRequest;
use crate::agent::probe;
use crate::error::Result;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

pub const PROBE_ARGS: &[&str] = &["--version"];

pub struct CodexBackend {
    settings: BackendSettings,
}

impl CodexBackend {
    /// Probe the binary, then build the adapter.
    pub fn new(settings: BackendSettings) -> Result<Self> {
        probe::check_available(
            BackendKind::Codex.name(),
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

impl BackendAdapter for CodexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Codex
    }

    fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn command_line(&self, request: &InvocationRequest) -> CommandLine {
        let mut command = CommandLine::new(&self.settings.binary).arg("exec");
        if let Some(model) = request.model() {
            command = command.args(["--model", model]);
        }
        // Sandboxed automatic execution without approval prompts.
        command.arg("--full-auto")
    }

    fn launch_plan(&self, request: &InvocationRequest) -> LaunchPlan {
        self.settings.plan(
            request,
            self.command_line(request),
            Some(request.prompt.as_bytes().to_vec()),
        )
    }
}
