//! Agent process launching.
//!
//! Two strategies share one [`LaunchPlan`]:
//!
//! - **Pipe**: stdout/stderr captured through pipes, optional stdin payload
//! - **Pseudo-terminal**: the agent sees a real terminal; input is typed
//!   into the controlling side and output is polled back from it
//!
//! Both enforce the invocation deadline, kill the whole process group on expiry,
//! and hand an [`Outcome`] to the normalizer. The working directory is a
//! spawn parameter; the caller's current directory is never touched.

mod deadline;
mod pipe;
mod pty;

pub use deadline::{Deadline, WaitOutcome, kill_process_tree, wait_with_deadline};

use crate::agent::invocation::{InvocationResult, Outcome};
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How an agent process is attached to this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Pipe,
    PseudoTerminal,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pipe => write!(f, "pipe"),
            Strategy::PseudoTerminal => write!(f, "pty"),
        }
    }
}

/// Program plus arguments, exactly as passed to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[cfg(test)]
    pub(crate) fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        write!(f, "{}", shell_words::join(words))
    }
}

/// Everything needed to start one agent process.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub command: CommandLine,
    pub working_dir: PathBuf,
    pub environment: BTreeMap<String, String>,
    /// Bytes fed to stdin (pipe) or typed into the terminal (pty).
    pub input: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// Launch with the given strategy and normalize whatever happened.
pub fn launch(strategy: Strategy, plan: &LaunchPlan) -> InvocationResult {
    tracing::info!(
        program = %plan.command.program,
        strategy = %strategy,
        working_dir = %plan.working_dir.display(),
        timeout_secs = plan.timeout.as_secs(),
        "launching agent"
    );

    let outcome = run(strategy, plan);
    if let Err(err) = &outcome {
        tracing::warn!(program = %plan.command.program, error = %err, "agent launch failed");
    }

    let result = InvocationResult::normalize(outcome);
    tracing::info!(
        program = %plan.command.program,
        success = result.success,
        returncode = result.returncode,
        stdout_bytes = result.stdout.len(),
        stderr_bytes = result.stderr.len(),
        "agent finished"
    );
    result
}

/// Launch with the given strategy without normalizing.
pub fn run(strategy: Strategy, plan: &LaunchPlan) -> Result<Outcome> {
    match strategy {
        Strategy::Pipe => pipe::run(plan),
        Strategy::PseudoTerminal => pty::run(plan),
    }
}
