//! Run log for agentrun.
//!
//! `agentrun run --record <path>` appends one JSON object per invocation to
//! an NDJSON file, so a series of runs can be audited or compared later.
//!
//! # Record Format
//!
//! Each line is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp taken when the invocation started
//! - `actor`: the invoking user (e.g., `user@HOST`)
//! - `backend`: `codex`, `cline`, or `claude`
//! - `working_dir`: directory the agent ran in
//! - `model`: model identifier, omitted when none was requested
//! - `duration_ms`, `timed_out`, `success`, `returncode`
//! - `stdout_bytes`, `stderr_bytes`: size of the captured text
//!
//! Prompts and agent output are not recorded.
//!
//! ```no_run
//! use agentrun::agent::{BackendKind, InvocationRequest, InvocationResult};
//! use agentrun::record::{RunRecord, append_record};
//! use std::time::Duration;
//!
//! let request = InvocationRequest::new("Fix the failing test", "/tmp/repo");
//! let result = InvocationResult::failed("not started");
//! let record = RunRecord::new(BackendKind::Codex, &request, &result, Duration::from_secs(3));
//! append_record("runs.ndjson", &record)?;
//! # Ok::<(), agentrun::error::AgentrunError>(())
//! ```

use crate::agent::{BackendKind, InvocationRequest, InvocationResult};
use crate::error::{AgentrunError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// One completed invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// When the invocation started.
    pub ts: DateTime<Utc>,

    /// Who ran it (e.g., `user@HOST`).
    pub actor: String,

    pub backend: BackendKind,

    pub working_dir: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub duration_ms: u64,

    pub timed_out: bool,

    pub success: bool,

    pub returncode: i32,

    pub stdout_bytes: usize,

    pub stderr_bytes: usize,
}

impl RunRecord {
    /// Build a record for an invocation that took `duration` and just ended.
    pub fn new(
        backend: BackendKind,
        request: &InvocationRequest,
        result: &InvocationResult,
        duration: Duration,
    ) -> Self {
        let elapsed = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            ts: Utc::now() - elapsed,
            actor: get_actor_string(),
            backend,
            working_dir: request.working_dir().display().to_string(),
            model: request.model().map(str::to_string),
            duration_ms: duration.as_millis().try_into().unwrap_or(u64::MAX),
            timed_out: result.is_timeout(),
            success: result.success,
            returncode: result.returncode,
            stdout_bytes: result.stdout.len(),
            stderr_bytes: result.stderr.len(),
        }
    }

    /// Serialize the record to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AgentrunError::UserError(format!("failed to serialize run record: {}", e)))
    }
}

/// Get the actor string for record metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append a record to the run log at `path`.
///
/// The file and its parent directory are created if missing. Each call
/// appends exactly one line with a trailing newline.
pub fn append_record<P: AsRef<Path>>(path: P, record: &RunRecord) -> Result<()> {
    let path = path.as_ref();
    let json_line = record.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            AgentrunError::UserError(format!(
                "failed to create run log directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            AgentrunError::UserError(format!(
                "failed to open run log '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        AgentrunError::UserError(format!(
            "failed to write run record to '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        AgentrunError::UserError(format!(
            "failed to sync run log '{}': {}",
            path.display(),
            e
        ))
    })?;

    tracing::debug!(path = %path.display(), "appended run record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_result() -> InvocationResult {
        InvocationResult {
            success: true,
            stdout: "done\n".to_string(),
            stderr: String::new(),
            returncode: 0,
        }
    }

    #[test]
    fn test_record_creation() {
        let request = InvocationRequest::new("prompt", "/tmp/repo").with_model("o4-mini");
        let record = RunRecord::new(
            BackendKind::Codex,
            &request,
            &sample_result(),
            Duration::from_millis(1500),
        );

        assert_eq!(record.backend, BackendKind::Codex);
        assert_eq!(record.working_dir, "/tmp/repo");
        assert_eq!(record.model.as_deref(), Some("o4-mini"));
        assert_eq!(record.duration_ms, 1500);
        assert!(record.success);
        assert!(!record.timed_out);
        assert_eq!(record.returncode, 0);
        assert_eq!(record.stdout_bytes, 5);
        assert_eq!(record.stderr_bytes, 0);
        assert!(record.actor.contains('@'));

        let age = Utc::now().signed_duration_since(record.ts);
        assert!(age.num_milliseconds() >= 1500);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_timeout_is_recorded() {
        let request = InvocationRequest::new("prompt", "/tmp/repo");
        let result = InvocationResult::timed_out(Duration::from_secs(600), b"partial", b"");
        let record = RunRecord::new(BackendKind::Cline, &request, &result, Duration::from_secs(600));

        assert!(record.timed_out);
        assert!(!record.success);
        assert_eq!(record.returncode, -1);
        assert_eq!(record.stdout_bytes, 7);
    }

    #[test]
    fn test_record_serialization() {
        let request = InvocationRequest::new("prompt", "/tmp/repo");
        let record = RunRecord::new(
            BackendKind::Claude,
            &request,
            &sample_result(),
            Duration::from_secs(2),
        );

        let json_line = record.to_ndjson_line().unwrap();
        assert!(!json_line.contains('\n'));
        assert!(json_line.contains("\"backend\":\"claude\""));

        // No model requested, so the field is omitted.
        let parsed: serde_json::Value = serde_json::from_str(&json_line).unwrap();
        assert!(parsed.get("model").is_none());

        let parsed: RunRecord = serde_json::from_str(&json_line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_append_record_multiple_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("logs").join("runs.ndjson");
        let request = InvocationRequest::new("prompt", "/tmp/repo");

        for kind in [BackendKind::Codex, BackendKind::Cline] {
            let record = RunRecord::new(kind, &request, &sample_result(), Duration::ZERO);
            append_record(&log, &record).unwrap();
        }

        let content = fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: RunRecord = serde_json::from_str(lines[0]).unwrap();
        let second: RunRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.backend, BackendKind::Codex);
        assert_eq!(second.backend, BackendKind::Cline);
    }

    #[test]
    fn test_append_record_to_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let request = InvocationRequest::new("prompt", "/tmp/repo");
        let record = RunRecord::new(BackendKind::Codex, &request, &sample_result(), Duration::ZERO);

        let err = append_record(temp_dir.path(), &record).unwrap_err();
        assert!(err.to_string().contains("failed to open run log"));
    }
}
