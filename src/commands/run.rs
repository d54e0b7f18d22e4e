//! Implementation of the `agentrun run` command.
//!
//! Runs one prompt through one backend:
//! 1. Resolves the backend (flag, then `default_backend` from the config)
//! 2. Reads the prompt from `--prompt` or `--prompt-file`
//! 3. Checks the backend binary is available
//! 4. Executes the agent in the working directory
//! 5. Prints the result and optionally appends a run record

use crate::agent::{
    BackendAdapter, BackendKind, InvocationRequest, InvocationResult, adapter, connect,
};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{AgentrunError, Result};
use crate::record::{RunRecord, append_record};
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Execute the `agentrun run` command.
///
/// Returns `AgentFailed` (exit 2) when the agent ran but did not succeed.
pub fn cmd_run(args: RunArgs, config: &Config) -> Result<()> {
    let kind = resolve_backend(args.backend, config)?;
    let prompt = read_prompt(&args)?;
    let settings = config.settings_for(kind, args.timeout);

    let mut request = InvocationRequest::new(prompt, &args.workdir);
    if let Some(model) = &args.model {
        request = request.with_model(model);
    }

    if args.dry_run {
        print_dry_run(adapter(kind, settings).as_ref(), &request);
        return Ok(());
    }

    let backend = connect(kind, settings)?;

    tracing::info!(
        backend = %kind,
        working_dir = %request.working_dir().display(),
        model = request.model().unwrap_or("-"),
        "dispatching agent"
    );

    let started = Instant::now();
    let result = backend.execute(&request);
    let duration = started.elapsed();

    if let Some(path) = &args.record {
        let record = RunRecord::new(kind, &request, &result, duration);
        // Best-effort: a broken run log must not hide the agent's result.
        if let Err(e) = append_record(path, &record) {
            eprintln!("Warning: failed to append run record: {}", e);
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result).map_err(|e| {
            AgentrunError::UserError(format!("failed to serialize result to JSON: {}", e))
        })?;
        println!("{}", json);
    } else {
        print_result(kind, &result, duration.as_secs_f64());
    }

    if !result.success {
        return Err(AgentrunError::AgentFailed {
            backend: kind.to_string(),
            returncode: result.returncode,
        });
    }

    Ok(())
}

/// Pick the backend: explicit flag first, then the config default.
fn resolve_backend(flag: Option<BackendKind>, config: &Config) -> Result<BackendKind> {
    flag.or(config.default_backend).ok_or_else(|| {
        AgentrunError::UserError(format!(
            "no backend selected.\n\n\
             Pass --backend <{}> or set `default_backend` in the config file.",
            BackendKind::ALL.map(|k| k.name()).join("|")
        ))
    })
}

/// Read the prompt text. `--prompt-file -` reads stdin.
fn read_prompt(args: &RunArgs) -> Result<String> {
    let prompt = match (&args.prompt, &args.prompt_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| AgentrunError::UserError(format!("failed to read prompt from stdin: {}", e)))?;
            text
        }
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            AgentrunError::UserError(format!(
                "failed to read prompt file '{}': {}",
                path.display(),
                e
            ))
        })?,
        (None, None) => {
            return Err(AgentrunError::UserError(
                "a prompt is required: pass --prompt or --prompt-file".to_string(),
            ));
        }
    };

    if prompt.trim().is_empty() {
        return Err(AgentrunError::UserError("prompt is empty".to_string()));
    }

    Ok(prompt)
}

/// Print dry run information.
fn print_dry_run(adapter: &dyn BackendAdapter, request: &InvocationRequest) {
    let kind = adapter.kind();
    let plan = adapter.launch_plan(request);

    println!("Dry run - would execute:");
    println!();
    println!("  Backend:   {} ({})", kind, kind.strategy());
    println!("  Command:   {}", plan.command);
    println!("  Workdir:   {}", plan.working_dir.display());
    println!("  Timeout:   {}s", plan.timeout.as_secs());
    if let Some(input) = &plan.input {
        println!("  Stdin:     {} bytes", input.len());
    }
    if request.model().is_some() && !kind.supports_model() {
        println!("  Note:      {} ignores the requested model", kind);
    }

    if !plan.environment.is_empty() {
        println!("  Environment:");
        for key in plan.environment.keys() {
            println!("    {}=...", key);
        }
    }
}

/// Print the agent's output followed by a short summary on stderr.
fn print_result(kind: BackendKind, result: &InvocationResult, seconds: f64) {
    if !result.stdout.is_empty() {
        print!("{}", result.stdout);
        if !result.stdout.ends_with('\n') {
            println!();
        }
    }
    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
        if !result.stderr.ends_with('\n') {
            eprintln!();
        }
    }

    eprintln!();
    if result.success {
        eprintln!("{} completed successfully in {:.2}s.", kind, seconds);
    } else if result.is_timeout() {
        eprintln!("WARNING: {} was terminated due to timeout ({:.2}s)", kind, seconds);
    } else {
        eprintln!(
            "WARNING: {} failed with returncode {} ({:.2}s)",
            kind, result.returncode, seconds
        );
    }
}
