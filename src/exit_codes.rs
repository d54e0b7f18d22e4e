//! Exit code constants for the agentrun CLI.
//!
//! - 0: Success (agent exited with code 0, or a non-run command succeeded)
//! - 1: User error (bad args, unreadable prompt, invalid config)
//! - 2: Agent failure (non-zero exit, timeout, or launch failure)
//! - 3: Configuration failure (agent binary or container runtime unavailable)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or unreadable input.
pub const USER_ERROR: i32 = 1;

/// The agent invocation returned `success == false`.
pub const AGENT_FAILURE: i32 = 2;

/// An agent binary or other required tool is missing or unresponsive.
pub const CONFIGURATION_FAILURE: i32 = 3;
