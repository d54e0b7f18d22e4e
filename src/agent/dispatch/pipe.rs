//! Pipe strategy: stdout and stderr drained by reader threads while the
//! deadline enforcer waits on the process.

use super::deadline::{Deadline, WaitOutcome, kill_process_tree, wait_with_deadline};
use super::LaunchPlan;
use crate::agent::invocation::Outcome;
use crate::error::{AgentrunError, Result};
use std::io::{Read, Write};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long readers get to finish after the process group was killed.
const READER_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8192;

pub(super) fn run(plan: &LaunchPlan) -> Result<Outcome> {
    let deadline = Deadline::start(plan.timeout);

    let mut command = Command::new(&plan.command.program);
    command
        .args(&plan.command.args)
        .current_dir(&plan.working_dir)
        .envs(&plan.environment)
        .stdin(if plan.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let mut child = command.spawn().map_err(|e| {
        AgentrunError::ProcessError(format!(
            "failed to start '{}' in '{}': {}",
            plan.command.program,
            plan.working_dir.display(),
            e
        ))
    })?;
    tracing::debug!(pid = child.id(), "agent started on pipes");

    let stdout = child.stdout.take().map(StreamCapture::spawn);
    let stderr = child.stderr.take().map(StreamCapture::spawn);

    if let (Some(mut stdin), Some(input)) = (child.stdin.take(), plan.input.clone()) {
        // Detached: an agent that never reads stdin must not block us. The
        // write ends with EPIPE once the process is gone.
        std::thread::spawn(move || {
            if let Err(e) = stdin.write_all(&input) {
                tracing::debug!(error = %e, "stdin write ended early");
            }
        });
    }

    match wait_with_deadline(&mut child, &deadline) {
        Ok(WaitOutcome::Exited(status)) => {
            // Grandchildren can keep the pipes open; wait for them only as
            // long as the deadline allows.
            let grace = deadline.remaining().max(READER_GRACE);
            let (stdout, stderr, drained) = collect(stdout, stderr, grace);
            if !drained {
                tracing::warn!("output pipes still open after exit, killing process group");
                kill_process_tree(&mut child);
            }
            Ok(Outcome::Exited {
                code: status.code(),
                stdout,
                stderr,
            })
        }
        Ok(WaitOutcome::TimedOut) => {
            tracing::warn!(
                pid = child.id(),
                timeout_secs = deadline.timeout().as_secs(),
                "agent timed out, killing process group"
            );
            kill_process_tree(&mut child);
            let (stdout, stderr, _) = collect(stdout, stderr, READER_GRACE);
            Ok(Outcome::TimedOut {
                timeout: deadline.timeout(),
                stdout,
                stderr,
            })
        }
        Err(e) => {
            kill_process_tree(&mut child);
            Err(AgentrunError::ProcessError(format!(
                "failed to check process status: {}",
                e
            )))
        }
    }
}

fn collect(
    stdout: Option<StreamCapture>,
    stderr: Option<StreamCapture>,
    grace: Duration,
) -> (Vec<u8>, Vec<u8>, bool) {
    // None when the grace period runs past what Instant can represent.
    let until = Instant::now().checked_add(grace);
    let (stdout, stdout_done) = stdout.map_or((Vec::new(), true), |c| c.finish(until));
    let (stderr, stderr_done) = stderr.map_or((Vec::new(), true), |c| c.finish(until));
    (stdout, stderr, stdout_done && stderr_done)
}

/// A reader thread accumulating one stream into a shared buffer, so that
/// whatever arrived is available even if the thread never finishes.
struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl StreamCapture {
    fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = std::thread::spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(|poison| poison.into_inner())
                        .extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "output reader stopped");
                        break;
                    }
                }
            }
        });
        Self { buffer, handle }
    }

    /// Take the captured bytes, waiting for EOF until `until` at most
    /// (unbounded when `None`). Returns whether the reader reached EOF.
    fn finish(self, until: Option<Instant>) -> (Vec<u8>, bool) {
        while !self.handle.is_finished() && until.is_none_or(|u| Instant::now() < u) {
            std::thread::sleep(Duration::from_millis(10));
        }
        let done = self.handle.is_finished();
        if done {
            let _ = self.handle.join();
        }
        let bytes = std::mem::take(
            &mut *self
                .buffer
                .lock()
                .unwrap_or_else(|poison| poison.into_inner()),
        );
        (bytes, done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::dispatch::CommandLine;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sh_plan(dir: &TempDir, script: &str, timeout: Duration) -> LaunchPlan {
        LaunchPlan {
            command: CommandLine::new("sh").args(["-c", script]),
            working_dir: dir.path().to_path_buf(),
            environment: BTreeMap::new(),
            input: None,
            timeout,
        }
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let dir = TempDir::new().unwrap();
        let plan = sh_plan(&dir, "printf OK; printf oops >&2", Duration::from_secs(10));

        let outcome = run(&plan).unwrap();
        assert_eq!(
            outcome,
            Outcome::Exited {
                code: Some(0),
                stdout: b"OK".to_vec(),
                stderr: b"oops".to_vec(),
            }
        );
    }

    #[test]
    fn feeds_stdin() {
        let dir = TempDir::new().unwrap();
        let mut plan = sh_plan(&dir, "cat", Duration::from_secs(10));
        plan.input = Some(b"prompt text".to_vec());

        match run(&plan).unwrap() {
            Outcome::Exited { code, stdout, .. } => {
                assert_eq!(code, Some(0));
                assert_eq!(stdout, b"prompt text");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn ignores_unread_stdin() {
        let dir = TempDir::new().unwrap();
        let mut plan = sh_plan(&dir, "echo done", Duration::from_secs(10));
        plan.input = Some(vec![b'x'; 1 << 20]);

        match run(&plan).unwrap() {
            Outcome::Exited { code, stdout, .. } => {
                assert_eq!(code, Some(0));
                assert_eq!(stdout, b"done\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        let plan = sh_plan(&dir, "pwd -P", Duration::from_secs(10));

        match run(&plan).unwrap() {
            Outcome::Exited { stdout, .. } => {
                let expected = dir.path().canonicalize().unwrap();
                assert_eq!(String::from_utf8_lossy(&stdout).trim(), expected.to_string_lossy());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn passes_environment() {
        let dir = TempDir::new().unwrap();
        let mut plan = sh_plan(&dir, "printf \"$AGENTRUN_TEST_VAR\"", Duration::from_secs(10));
        plan.environment
            .insert("AGENTRUN_TEST_VAR".to_string(), "test_value".to_string());

        match run(&plan).unwrap() {
            Outcome::Exited { stdout, .. } => assert_eq!(stdout, b"test_value"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn timeout_keeps_partial_output() {
        let dir = TempDir::new().unwrap();
        let plan = sh_plan(
            &dir,
            "echo partial; echo warming >&2; sleep 30",
            Duration::from_secs(1),
        );

        let started = Instant::now();
        match run(&plan).unwrap() {
            Outcome::TimedOut {
                timeout,
                stdout,
                stderr,
            } => {
                assert_eq!(timeout, Duration::from_secs(1));
                assert_eq!(stdout, b"partial\n");
                assert_eq!(stderr, b"warming\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn huge_timeout_does_not_overflow() {
        let dir = TempDir::new().unwrap();
        let plan = sh_plan(&dir, "printf OK", Duration::from_secs(u64::MAX));

        assert_eq!(
            run(&plan).unwrap(),
            Outcome::Exited {
                code: Some(0),
                stdout: b"OK".to_vec(),
                stderr: Vec::new(),
            }
        );
    }

    #[test]
    fn missing_program_is_process_error() {
        let dir = TempDir::new().unwrap();
        let plan = LaunchPlan {
            command: CommandLine::new("nonexistent_agent_xyz_123"),
            working_dir: dir.path().to_path_buf(),
            environment: BTreeMap::new(),
            input: None,
            timeout: Duration::from_secs(5),
        };

        let err = run(&plan).unwrap_err();
        assert!(err.to_string().contains("failed to start 'nonexistent_agent_xyz_123'"));
    }

    #[test]
    fn missing_working_dir_is_process_error() {
        let dir = TempDir::new().unwrap();
        let mut plan = sh_plan(&dir, "true", Duration::from_secs(5));
        plan.working_dir = dir.path().join("does-not-exist");

        assert!(run(&plan).is_err());
    }
}
