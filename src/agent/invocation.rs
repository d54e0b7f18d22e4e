//! Per-call request and result types, and the normalizer that turns a raw
//! process outcome into the uniform [`InvocationResult`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Return code reported when the agent never produced an exit status of its
/// own (timeout, spawn failure, killed by a signal).
pub const FAILURE_RETURNCODE: i32 = -1;

/// Leading text of every timeout message.
const TIMEOUT_PREFIX: &str = "Command timed out";

/// How much of the partial stderr is echoed into a timeout message.
const PARTIAL_STDERR_PREVIEW_CHARS: usize = 500;

/// One prompt to run in one working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Natural-language task prompt.
    pub prompt: String,
    /// Directory the agent process is started in.
    pub working_dir: PathBuf,
    /// Backend-specific model name. Backends without per-call model
    /// selection ignore it.
    pub model: Option<String>,
}

impl InvocationRequest {
    pub fn new(prompt: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            working_dir: working_dir.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The model, treating an empty string the same as no model.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }
}

/// Uniform outcome of an agent invocation.
///
/// Serializes to `{"success", "stdout", "stderr", "returncode"}`, the shape
/// every caller consumes regardless of backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

/// What the launcher observed before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The process exited on its own. `code` is `None` when it was killed by
    /// a signal.
    Exited {
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// The deadline elapsed and the process was killed.
    TimedOut {
        timeout: Duration,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
}

impl InvocationResult {
    /// Normalize a launcher result. Launcher errors become failure results
    /// carrying the error text in `stderr`.
    pub fn normalize(outcome: Result<Outcome>) -> Self {
        match outcome {
            Ok(Outcome::Exited {
                code,
                stdout,
                stderr,
            }) => Self::exited(code, &stdout, &stderr),
            Ok(Outcome::TimedOut {
                timeout,
                stdout,
                stderr,
            }) => Self::timed_out(timeout, &stdout, &stderr),
            Err(err) => Self::failed(err),
        }
    }

    /// A process that exited by itself.
    pub fn exited(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Self {
        let returncode = code.unwrap_or(FAILURE_RETURNCODE);
        Self {
            success: returncode == 0,
            stdout: decode(stdout),
            stderr: decode(stderr),
            returncode,
        }
    }

    /// A process killed at its deadline. Partial output is kept and its size
    /// is reported in `stderr`.
    pub fn timed_out(timeout: Duration, stdout: &[u8], stderr: &[u8]) -> Self {
        let partial_stdout = decode(stdout);
        let partial_stderr = decode(stderr);

        let mut message = format!("{} after {}", TIMEOUT_PREFIX, describe_timeout(timeout));
        if !partial_stdout.is_empty() || !partial_stderr.is_empty() {
            message.push_str(&format!(
                ". Partial output - stdout: {} bytes, stderr: {} bytes",
                stdout.len(),
                stderr.len()
            ));
        }
        if !partial_stderr.is_empty() {
            let preview: String = partial_stderr
                .chars()
                .take(PARTIAL_STDERR_PREVIEW_CHARS)
                .collect();
            message.push_str(&format!("\nPartial stderr: {}", preview));
        }

        Self {
            success: false,
            stdout: partial_stdout,
            stderr: message,
            returncode: FAILURE_RETURNCODE,
        }
    }

    /// Whether this result came from a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        !self.success
            && self.returncode == FAILURE_RETURNCODE
            && self.stderr.starts_with(TIMEOUT_PREFIX)
    }

    /// The call failed before the agent could produce a result.
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: err.to_string(),
            returncode: FAILURE_RETURNCODE,
        }
    }
}

/// A file edit reported by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Extract structured file changes from an agent response.
///
/// Agents edit the working tree directly, so nothing is parsed out of their
/// text yet and this always returns an empty list.
pub fn extract_file_changes(_response: &str) -> Vec<FileChange> {
    Vec::new()
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn describe_timeout(timeout: Duration) -> String {
    let secs = timeout.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else if secs == 0 {
        format!("{} ms", timeout.as_millis())
    } else {
        format!("{} second{}", secs, if secs == 1 { "" } else { "s" })
    }
}
