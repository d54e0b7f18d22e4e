//! agentrun: a uniform execution layer for command-line coding agents.
//!
//! Each supported agent CLI (codex, cline, claude) is wrapped by a backend
//! adapter that takes a prompt and a working directory, runs the agent as a
//! child process under a deadline, and reports a normalized
//! [`InvocationResult`](agent::InvocationResult).

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod record;

#[cfg(test)]
mod test_support;
