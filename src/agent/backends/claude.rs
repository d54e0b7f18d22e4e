//! Claude Code adapter.
//!
//! Claude refuses to run without an interactive terminal, so it is started
//! on a pseudo-terminal and the prompt is typed in followed by a newline.

use crate::agent::backend::{BackendAdapter, BackendKind, BackendSettings};
use crate::agent::dispatch::{CommandLine, LaunchPlan};
use crate::agent::invocation::InvocationRequest;
use crate::agent::probe;
use crate::error::Result;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

pub const PROBE_ARGS: &[&str] = &["--version"];

pub struct ClaudeBackend {
    settings: BackendSettings,
}

impl ClaudeBackend {
    /// Probe the binary, then build the adapter.
    pub fn new(settings: BackendSettings) -> Result<Self> {
        probe::check_available(
            BackendKind::Claude.name(),
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

impl BackendAdapter for ClaudeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Claude
    }

    fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn command_line(&self, request: &InvocationRequest) -> CommandLine {
        let command = CommandLine::new(&self.settings.binary).arg("--dangerously-skip-permissions");
        match request.model() {
            Some(model) => command.args(["--model", model]),
            None => command,
        }
    }

    fn launch_plan(&self, request: &InvocationRequest) -> LaunchPlan {
        let mut input = request.prompt.clone().into_bytes();
        input.push(b'\n');
        self.settings.plan(request, self.command_line(request), Some(input))
    }
}
