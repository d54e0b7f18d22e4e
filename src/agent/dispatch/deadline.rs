//! Wall-clock deadline shared by both launch strategies.

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::io;
use std::process::{Child, ExitStatus};
use std::time::{Duration, Instant};

/// Interval between process-exit checks and terminal polls.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A fixed budget measured from the start of an invocation.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn start(timeout: Duration) -> Self {
        Self {
            start: Instant::now(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn expired(&self) -> bool {
        self.elapsed() >= self.timeout
    }

    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.elapsed())
    }

    /// Next sleep or poll interval, never past the deadline.
    pub fn next_tick(&self) -> Duration {
        POLL_INTERVAL.min(self.remaining())
    }
}

/// How waiting on a child ended.
#[derive(Debug)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
}

/// Wait for a child process until it exits or the deadline passes.
///
/// On timeout the child is left running; callers decide how to kill it.
pub fn wait_with_deadline(child: &mut Child, deadline: &Deadline) -> io::Result<WaitOutcome> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(WaitOutcome::Exited(status));
        }
        if deadline.expired() {
            return Ok(WaitOutcome::TimedOut);
        }
        std::thread::sleep(deadline.next_tick());
    }
}

/// Kill a child and everything in its process group, then reap it.
///
/// Agents are always started as group leaders, so the group id is the pid.
pub fn kill_process_tree(child: &mut Child) {
    let pid = Pid::from_raw(child.id() as i32);
    if let Err(errno) = killpg(pid, Signal::SIGKILL) {
        tracing::debug!(pid = child.id(), %errno, "killpg failed, killing child only");
        let _ = child.kill();
    }
    let _ = child.wait();
}

/// Kill what is left of a process group whose leader was already reaped.
pub(crate) fn kill_process_group(pgid: u32) {
    if let Err(errno) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        tracing::debug!(pgid, %errno, "process group already gone");
    }
}
