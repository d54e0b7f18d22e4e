//! Configuration model for agentrun.
//!
//! This module defines the Config struct that represents `agentrun.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are kept),
//! sensible defaults for optional fields, and validation of config values.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{Config, DEFAULT_CONFIG_FILE};
pub use types::BackendOverrides;
