//! Command implementations for agentrun.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. The config file is resolved once here and handed to
//! every command.

mod backends;
mod doctor;
mod run;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::Result;

pub use backends::cmd_backends;
pub use doctor::cmd_doctor;
pub use run::cmd_run;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => cmd_run(args, &config),
        Command::Backends => cmd_backends(&config),
        Command::Doctor(args) => cmd_doctor(args, &config),
    }
}
