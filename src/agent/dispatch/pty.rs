//! Pseudo-terminal strategy for agents that refuse to run without a TTY.
//!
//! The agent is started in a new session with the subordinate side of a
//! fresh pty as its controlling terminal and stdio. This process keeps only
//! the controlling side, types the input into it, and polls it for output.
//!
//! The collection loop is an explicit state machine:
//!
//! ```text
//! Starting --> Polling --(child exited)--> Draining --> Done
//!                 |
//!                 +--(deadline)--> killed, partial output returned
//! ```
//!
//! Every descriptor is an owned handle, so all of them are closed on every
//! return path. A session dropped with a live child kills its process group.

use super::deadline::{Deadline, POLL_INTERVAL, kill_process_group, kill_process_tree};
use super::LaunchPlan;
use crate::agent::invocation::Outcome;
use crate::error::{AgentrunError, Result};
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::libc;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::pty::{Winsize, openpty};
use nix::sys::termios::{LocalFlags, SetArg, tcgetattr, tcsetattr};
use nix::unistd::setsid;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const TERMINAL_COLS: u16 = 200;
const TERMINAL_ROWS: u16 = 50;

/// Poll interval while draining after exit.
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Upper bound on the drain pass, in case a grandchild keeps writing.
const DRAIN_BUDGET: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8192;

#[derive(Debug, Clone, Copy)]
enum PtyState {
    Starting,
    Polling,
    Draining { status: ExitStatus, until: Instant },
    Done(ExitStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStatus {
    Data,
    Idle,
    Closed,
}

pub(super) fn run(plan: &LaunchPlan) -> Result<Outcome> {
    let deadline = Deadline::start(plan.timeout);
    let mut session = TerminalSession::open(plan)?;
    tracing::debug!(pid = session.child.id(), "agent started on pseudo-terminal");

    let mut state = PtyState::Starting;
    loop {
        state = match state {
            PtyState::Starting => {
                session.write_input()?;
                PtyState::Polling
            }
            PtyState::Polling => {
                if deadline.expired() {
                    tracing::warn!(
                        pid = session.child.id(),
                        timeout_secs = deadline.timeout().as_secs(),
                        collected_bytes = session.output.len(),
                        "agent timed out, killing session"
                    );
                    kill_process_tree(&mut session.child);
                    return Ok(Outcome::TimedOut {
                        timeout: deadline.timeout(),
                        stdout: session.take_output(),
                        stderr: Vec::new(),
                    });
                }
                session.write_input()?;
                session.read_available(deadline.next_tick())?;
                match session.child.try_wait() {
                    Ok(Some(status)) => PtyState::Draining {
                        status,
                        until: Instant::now() + DRAIN_BUDGET,
                    },
                    Ok(None) => PtyState::Polling,
                    Err(e) => return Err(terminal_error("check process status", e)),
                }
            }
            PtyState::Draining { status, until } => match session.read_available(DRAIN_POLL)? {
                ReadStatus::Data if Instant::now() < until => PtyState::Draining { status, until },
                ReadStatus::Data => {
                    // Something the agent left behind still holds the terminal.
                    tracing::warn!(
                        pid = session.child.id(),
                        "terminal still busy after exit, killing process group"
                    );
                    kill_process_group(session.child.id());
                    PtyState::Done(status)
                }
                _ => PtyState::Done(status),
            },
            PtyState::Done(status) => {
                return Ok(Outcome::Exited {
                    code: status.code(),
                    stdout: session.take_output(),
                    stderr: Vec::new(),
                });
            }
        };
    }
}

/// The controlling side of the terminal plus the process attached to it.
struct TerminalSession {
    master: File,
    child: Child,
    output: Vec<u8>,
    input: Vec<u8>,
    written: usize,
    closed: bool,
}

impl TerminalSession {
    fn open(plan: &LaunchPlan) -> Result<Self> {
        let winsize = Winsize {
            ws_row: TERMINAL_ROWS,
            ws_col: TERMINAL_COLS,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pty = openpty(Some(&winsize), None)
            .map_err(|e| terminal_error("allocate pseudo-terminal", e))?;

        disable_echo(&pty.slave)?;
        set_nonblocking(&pty.master)?;
        let child = spawn_attached(plan, pty.slave)?;

        Ok(Self {
            master: File::from(pty.master),
            child,
            output: Vec::new(),
            input: plan.input.clone().unwrap_or_default(),
            written: 0,
            closed: false,
        })
    }

    /// Push as much pending input as the terminal accepts right now.
    fn write_input(&mut self) -> Result<()> {
        while self.written < self.input.len() {
            match (&self.master).write(&self.input[self.written..]) {
                Ok(0) => break,
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                    tracing::debug!("terminal closed before input was fully written");
                    self.written = self.input.len();
                }
                Err(e) => return Err(terminal_error("write to pseudo-terminal", e)),
            }
        }
        Ok(())
    }

    /// Wait up to `wait` for output and read everything available.
    fn read_available(&mut self, wait: Duration) -> Result<ReadStatus> {
        if self.closed {
            std::thread::sleep(wait);
            return Ok(ReadStatus::Closed);
        }

        let millis = u16::try_from(wait.as_millis()).unwrap_or(u16::MAX);
        let ready = {
            let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(millis)) {
                Ok(0) => false,
                Ok(_) => fds[0].revents().is_some_and(|r| !r.is_empty()),
                Err(nix::errno::Errno::EINTR) => false,
                Err(e) => return Err(terminal_error("poll pseudo-terminal", e)),
            }
        };
        if !ready {
            return Ok(ReadStatus::Idle);
        }

        let mut status = ReadStatus::Idle;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match (&self.master).read(&mut chunk) {
                Ok(0) => {
                    self.closed = true;
                    return Ok(ReadStatus::Closed);
                }
                Ok(n) => {
                    self.output.extend_from_slice(&chunk[..n]);
                    status = ReadStatus::Data;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(status),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Linux reports a hung-up terminal as EIO.
                Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                    self.closed = true;
                    return Ok(if status == ReadStatus::Data {
                        ReadStatus::Data
                    } else {
                        ReadStatus::Closed
                    });
                }
                Err(e) => return Err(terminal_error("read from pseudo-terminal", e)),
            }
        }
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            kill_process_tree(&mut self.child);
        }
    }
}

fn spawn_attached(plan: &LaunchPlan, slave: OwnedFd) -> Result<Child> {
    let stdin = slave
        .try_clone()
        .map_err(|e| terminal_error("duplicate terminal descriptor", e))?;
    let stdout = slave
        .try_clone()
        .map_err(|e| terminal_error("duplicate terminal descriptor", e))?;

    let mut command = Command::new(&plan.command.program);
    command
        .args(&plan.command.args)
        .current_dir(&plan.working_dir)
        .envs(&plan.environment)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(slave));

    // SAFETY: the hook only calls async-signal-safe functions (setsid, ioctl)
    // between fork and exec.
    unsafe {
        command.pre_exec(attach_controlling_terminal);
    }

    // `command` owns the parent's copies of the subordinate side and closes
    // them when it goes out of scope, so hang-ups reach the controlling side.
    command.spawn().map_err(|e| {
        AgentrunError::ProcessError(format!(
            "failed to start '{}' in '{}': {}",
            plan.command.program,
            plan.working_dir.display(),
            e
        ))
    })
}

/// Runs in the child: new session, stdin's terminal becomes the controlling one.
fn attach_controlling_terminal() -> io::Result<()> {
    setsid().map_err(io::Error::from)?;
    // SAFETY: fd 0 is the subordinate terminal at this point.
    if unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY as _, 0) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn disable_echo(slave: &OwnedFd) -> Result<()> {
    let mut attrs = tcgetattr(slave).map_err(|e| terminal_error("read terminal attributes", e))?;
    attrs.local_flags.remove(LocalFlags::ECHO);
    tcsetattr(slave, SetArg::TCSANOW, &attrs)
        .map_err(|e| terminal_error("set terminal attributes", e))
}

fn set_nonblocking(master: &OwnedFd) -> Result<()> {
    let fd = master.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| terminal_error("read descriptor flags", e))?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| terminal_error("set non-blocking mode", e))?;
    Ok(())
}

fn terminal_error(action: &str, err: impl std::fmt::Display) -> AgentrunError {
    AgentrunError::ProcessError(format!("failed to {}: {}", action, err))
}
