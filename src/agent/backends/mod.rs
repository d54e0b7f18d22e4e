//! Concrete adapters. Each module owns its agent's command-line policy and
//! availability probe; launching and normalization are shared.

pub mod claude;
pub mod cline;
pub mod codex;

pub use claude::ClaudeBackend;
pub use cline::ClineBackend;
pub use codex::CodexBackend;
