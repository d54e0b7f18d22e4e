//! The backend abstraction: one adapter per agent family, all producing the
//! same [`InvocationResult`].

use super::backends::{claude, cline, codex};
use super::dispatch::{self, CommandLine, LaunchPlan, Strategy};
use super::invocation::{self, FileChange, InvocationRequest, InvocationResult};
use crate::error::{AgentrunError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default budget for the availability probe run at construction.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Known agent families.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Codex,
    Cline,
    Claude,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Codex, BackendKind::Cline, BackendKind::Claude];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Codex => "codex",
            BackendKind::Cline => "cline",
            BackendKind::Claude => "claude",
        }
    }

    /// Executable looked up on PATH when no override is configured.
    pub fn default_binary(&self) -> &'static str {
        self.name()
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            BackendKind::Codex | BackendKind::Cline => Strategy::Pipe,
            BackendKind::Claude => Strategy::PseudoTerminal,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            BackendKind::Codex => codex::DEFAULT_TIMEOUT,
            BackendKind::Cline => cline::DEFAULT_TIMEOUT,
            BackendKind::Claude => claude::DEFAULT_TIMEOUT,
        }
    }

    /// Arguments of the cheap sub-command used to check the binary answers.
    pub fn probe_args(&self) -> &'static [&'static str] {
        match self {
            BackendKind::Codex => codex::PROBE_ARGS,
            BackendKind::Cline => cline::PROBE_ARGS,
            BackendKind::Claude => claude::PROBE_ARGS,
        }
    }

    /// Whether a per-call model can be passed on the command line.
    pub fn supports_model(&self) -> bool {
        !matches!(self, BackendKind::Cline)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BackendKind {
    type Err = AgentrunError;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AgentrunError::UserError(format!(
                    "unknown backend '{}'. Available backends: {}",
                    s,
                    BackendKind::ALL.map(|k| k.name()).join(", ")
                ))
            })
    }
}

/// Effective per-backend settings after config and CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub binary: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
    /// Extra environment variables for the agent process.
    pub environment: BTreeMap<String, String>,
}

impl BackendSettings {
    pub fn defaults(kind: BackendKind) -> Self {
        Self {
            binary: kind.default_binary().to_string(),
            timeout: kind.default_timeout(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Plan with the fields every backend shares.
    pub(crate) fn plan(
        &self,
        request: &InvocationRequest,
        command: CommandLine,
        input: Option<Vec<u8>>,
    ) -> LaunchPlan {
        LaunchPlan {
            command,
            working_dir: request.working_dir.clone(),
            environment: self.environment.clone(),
            input,
            timeout: self.timeout,
        }
    }
}

/// Executes a prompt in a working directory and returns an
/// [`InvocationResult`].
///
/// Implementations are constructed once, after their binary passed an
/// availability probe. `execute` never returns an error: every per-call
/// failure is folded into the result.
pub trait BackendAdapter {
    fn kind(&self) -> BackendKind;

    fn settings(&self) -> &BackendSettings;

    /// Program and arguments for `request`.
    fn command_line(&self, request: &InvocationRequest) -> CommandLine;

    /// Full launch plan for `request`: command, input channel, deadline.
    fn launch_plan(&self, request: &InvocationRequest) -> LaunchPlan;

    fn execute(&self, request: &InvocationRequest) -> InvocationResult {
        let plan = self.launch_plan(request);
        dispatch::launch(self.kind().strategy(), &plan)
    }

    fn extract_file_changes(&self, response: &str) -> Vec<FileChange> {
        invocation::extract_file_changes(response)
    }
}

/// Build the adapter for `kind` without probing its binary.
///
/// Used where nothing is executed, such as dry runs.
pub fn adapter(kind: BackendKind, settings: BackendSettings) -> Box<dyn BackendAdapter> {
    match kind {
        BackendKind::Codex => Box::new(codex::CodexBackend::without_probe(settings)),
        BackendKind::Cline => Box::new(cline::ClineBackend::without_probe(settings)),
        BackendKind::Claude => Box::new(claude::ClaudeBackend::without_probe(settings)),
    }
}

/// Construct the adapter for `kind`, failing fast if its binary is missing.
pub fn connect(kind: BackendKind, settings: BackendSettings) -> Result<Box<dyn BackendAdapter>> {
    Ok(match kind {
        BackendKind::Codex => Box::new(codex::CodexBackend::new(settings)?),
        BackendKind::Cline => Box::new(cline::ClineBackend::new(settings)?),
        BackendKind::Claude => Box::new(claude::ClaudeBackend::new(settings)?),
    })
}
