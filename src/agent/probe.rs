//! Availability probe run when an adapter is constructed.
//!
//! The probe runs a cheap sub-command (`--version`, `version`) through the
//! pipe launcher with a short deadline. A missing binary, a non-zero exit, or
//! no answer within the deadline all become a configuration error.

use super::dispatch::{self, CommandLine, LaunchPlan, Strategy};
use super::invocation::Outcome;
use crate::error::{AgentrunError, Result};
use std::collections::BTreeMap;
use std::time::Duration;

/// How much probe stderr is quoted in an error.
const STDERR_EXCERPT_CHARS: usize = 300;

/// Run `binary args...` and return the first line it printed.
///
/// `name` identifies the dependency in error messages.
pub fn check_available(name: &str, binary: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let command = CommandLine::new(binary).args(args.iter().copied());
    let plan = LaunchPlan {
        command: command.clone(),
        working_dir: std::env::temp_dir(),
        environment: BTreeMap::new(),
        input: None,
        timeout,
    };

    tracing::debug!(backend = name, command = %command, "probing agent binary");

    match dispatch::run(Strategy::Pipe, &plan) {
        Ok(Outcome::Exited {
            code: Some(0),
            stdout,
            ..
        }) => {
            let stdout = String::from_utf8_lossy(&stdout);
            let version = stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("ok")
                .to_string();
            tracing::debug!(backend = name, version = %version, "agent binary available");
            Ok(version)
        }
        Ok(Outcome::Exited { code, stderr, .. }) => {
            let stderr = String::from_utf8_lossy(&stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect();
            Err(AgentrunError::configuration(
                name,
                format!(
                    "'{}' exited with {}{}",
                    command,
                    code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)),
                    if excerpt.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", excerpt)
                    }
                ),
            ))
        }
        Ok(Outcome::TimedOut { timeout, .. }) => Err(AgentrunError::configuration(
            name,
            format!(
                "'{}' did not respond within {} seconds",
                command,
                timeout.as_secs()
            ),
        )),
        Err(e) => Err(AgentrunError::configuration(
            name,
            format!(
                "'{}' not found. Please ensure '{}' is installed and in PATH ({})",
                binary, binary, e
            ),
        )),
    }
}
