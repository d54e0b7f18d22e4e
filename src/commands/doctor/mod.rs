//! Implementation of the `agentrun doctor` command.
//!
//! Checks the environment agents run in:
//! - Each backend binary answers its availability probe
//! - The container runtime is installed (`docker --version`)
//! - The container daemon is reachable (`docker ps`)
//!
//! The environment is usable when at least one backend and the container
//! runtime pass. Otherwise the command exits with a configuration failure.

mod checks;
mod display;


use crate::cli::DoctorArgs;
use crate::config::Config;
use crate::error::{AgentrunError, Result};
use serde::Serialize;

pub use checks::*;
pub use display::*;

/// Container runtime binary looked up on PATH.
pub const DOCKER_BINARY: &str = "docker";

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "OK"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// What a check looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Backend,
    ContainerRuntime,
}

/// A single check with what it found and, on failure, how to fix it.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub category: CheckCategory,
    pub status: CheckStatus,
    /// Version line on success, failure reason otherwise.
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Check {
    pub fn pass(name: &str, category: CheckCategory, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            category,
            status: CheckStatus::Pass,
            detail: detail.into(),
            remediation: None,
        }
    }

    pub fn fail(name: &str, category: CheckCategory, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            category,
            status: CheckStatus::Fail,
            detail: detail.into(),
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Result of running the doctor checks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<Check>,
}

impl DoctorReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn passing(&self, category: CheckCategory) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(move |c| c.category == category && c.passed())
    }

    /// Names of backends whose binary answered its probe.
    pub fn available_backends(&self) -> Vec<&str> {
        self.passing(CheckCategory::Backend)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether every container runtime check passed.
    pub fn container_runtime_ok(&self) -> bool {
        let mut runtime = self
            .checks
            .iter()
            .filter(|c| c.category == CheckCategory::ContainerRuntime)
            .peekable();
        runtime.peek().is_some() && runtime.all(Check::passed)
    }

    pub fn is_healthy(&self) -> bool {
        !self.available_backends().is_empty() && self.container_runtime_ok()
    }
}

/// Execute the `agentrun doctor` command.
pub fn cmd_doctor(args: DoctorArgs, config: &Config) -> Result<()> {
    let report = run_checks(config, DOCKER_BINARY);

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if report.available_backends().is_empty() {
        return Err(AgentrunError::configuration(
            "agent backends",
            "none of codex, cline, claude answered its availability probe",
        ));
    }

    if !report.container_runtime_ok() {
        return Err(AgentrunError::configuration(
            DOCKER_BINARY,
            "the container runtime is missing or its daemon is not running",
        ));
    }

    Ok(())
}
