//! Agent execution layer.
//!
//! - **Invocation**: request/result types and the result normalizer
//! - **Backend**: the [`BackendAdapter`] trait and the backend registry
//! - **Backends**: codex and cline over pipes, claude over a pseudo-terminal
//! - **Dispatch**: process launching, output collection, deadline enforcement
//! - **Probe**: availability check run at adapter construction
//!
//! # Usage
//!
//! ```no_run
//! use agentrun::agent::{BackendKind, BackendSettings, InvocationRequest, connect};
//!
//! let adapter = connect(BackendKind::Codex, BackendSettings::defaults(BackendKind::Codex))?;
//! let request = InvocationRequest::new("Fix the failing test", "/tmp/repo").with_model("o4-mini");
//! let result = adapter.execute(&request);
//! println!("success={} returncode={}", result.success, result.returncode);
//! # Ok::<(), agentrun::error::AgentrunError>(())
//! ```

mod backend;
pub mod backends;
pub mod dispatch;
mod invocation;
pub mod probe;

pub use backend::{
    BackendAdapter, BackendKind, BackendSettings, DEFAULT_PROBE_TIMEOUT, adapter, connect,
};
pub use invocation::{
    FAILURE_RETURNCODE, FileChange, InvocationRequest, InvocationResult, Outcome,
    extract_file_changes,
};
