//! Error types for agentrun.
//!
//! Only construction-time and CLI-level failures surface as errors. Anything
//! that goes wrong while an agent is running is folded into an
//! [`InvocationResult`](crate::agent::InvocationResult) instead.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for agentrun operations.
#[derive(Error, Debug)]
pub enum AgentrunError {
    /// User provided invalid arguments, config, or input files.
    #[error("{0}")]
    UserError(String),

    /// A backend binary is missing or does not answer its availability probe.
    #[error("{backend} is not available: {message}")]
    ConfigurationError { backend: String, message: String },

    /// Launching or talking to an agent process failed.
    #[error("process error: {0}")]
    ProcessError(String),

    /// The invocation completed but did not succeed.
    #[error("{backend} agent failed (returncode {returncode})")]
    AgentFailed { backend: String, returncode: i32 },
}

impl AgentrunError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentrunError::UserError(_) => exit_codes::USER_ERROR,
            AgentrunError::ConfigurationError { .. } => exit_codes::CONFIGURATION_FAILURE,
            AgentrunError::ProcessError(_) => exit_codes::AGENT_FAILURE,
            AgentrunError::AgentFailed { .. } => exit_codes::AGENT_FAILURE,
        }
    }

    pub(crate) fn configuration(backend: impl Into<String>, message: impl Into<String>) -> Self {
        AgentrunError::ConfigurationError {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for agentrun operations.
pub type Result<T> = std::result::Result<T, AgentrunError>;
