//! CLI argument parsing for agentrun.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::agent::BackendKind;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// agentrun: run command-line coding agents (codex, cline, claude) through
/// one interface.
///
/// Every run takes a prompt and a working directory and reports success,
/// captured stdout/stderr, and a return code, whichever agent is used.
#[derive(Parser, Debug)]
#[command(name = "agentrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./agentrun.yaml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for agentrun.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a prompt through an agent backend.
    ///
    /// Checks that the backend binary is available, runs it once in the
    /// working directory, and prints the normalized result.
    Run(RunArgs),

    /// List known backends and their effective settings.
    Backends,

    /// Check that agent binaries and the container runtime are usable.
    Doctor(DoctorArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["prompt", "prompt_file"])))]
pub struct RunArgs {
    /// Backend to run. Falls back to `default_backend` from the config.
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory the agent runs in.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub workdir: PathBuf,

    /// Prompt text.
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Read the prompt from a file ("-" reads stdin).
    #[arg(long, value_name = "PATH")]
    pub prompt_file: Option<PathBuf>,

    /// Model identifier passed to backends that accept one.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Deadline in seconds, overriding config and backend default.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Append a run record to this NDJSON file.
    #[arg(long, value_name = "PATH")]
    pub record: Option<PathBuf>,

    /// Show the command that would be executed without running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `doctor` command.
#[derive(Parser, Debug)]
pub struct DoctorArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
