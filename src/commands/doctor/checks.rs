//! Individual checks for the doctor command.

use super::{Check, CheckCategory, DoctorReport};
use crate::agent::probe::check_available;
use crate::agent::{BackendKind, BackendSettings};
use crate::config::Config;
use crate::error::AgentrunError;
use std::time::Duration;

/// Run every check: all backends, then the container runtime.
pub fn run_checks(config: &Config, docker_binary: &str) -> DoctorReport {
    let mut report = DoctorReport::new();

    for kind in BackendKind::ALL {
        report
            .checks
            .push(check_backend(kind, &config.settings_for(kind, None)));
    }

    let probe_timeout = Duration::from_secs(config.probe_timeout_seconds);
    report
        .checks
        .extend(check_container_runtime(docker_binary, probe_timeout));

    report
}

/// Probe one backend binary.
pub fn check_backend(kind: BackendKind, settings: &BackendSettings) -> Check {
    match check_available(
        kind.name(),
        &settings.binary,
        kind.probe_args(),
        settings.probe_timeout,
    ) {
        Ok(version) => Check::pass(kind.name(), CheckCategory::Backend, version),
        Err(e) => Check::fail(kind.name(), CheckCategory::Backend, failure_detail(e))
            .with_remediation(install_hint(kind)),
    }
}

/// Check the container runtime is installed, then that its daemon answers.
///
/// The daemon check is skipped when the binary itself is unusable.
pub fn check_container_runtime(binary: &str, timeout: Duration) -> Vec<Check> {
    let installed = match check_available("docker", binary, &["--version"], timeout) {
        Ok(version) => Check::pass("docker", CheckCategory::ContainerRuntime, version),
        Err(e) => {
            return vec![
                Check::fail("docker", CheckCategory::ContainerRuntime, failure_detail(e))
                    .with_remediation(
                        "Install Docker: https://www.docker.com/products/docker-desktop/",
                    ),
            ];
        }
    };

    let daemon = match check_available("docker daemon", binary, &["ps"], timeout) {
        Ok(_) => Check::pass(
            "docker daemon",
            CheckCategory::ContainerRuntime,
            "daemon is running",
        ),
        Err(e) => Check::fail(
            "docker daemon",
            CheckCategory::ContainerRuntime,
            failure_detail(e),
        )
        .with_remediation(
            "Start the daemon: sudo systemctl start docker (Linux)\n\
             Or start Docker Desktop (macOS/Windows)",
        ),
    };

    vec![installed, daemon]
}

fn failure_detail(err: AgentrunError) -> String {
    match err {
        AgentrunError::ConfigurationError { message, .. } => message,
        other => other.to_string(),
    }
}

fn install_hint(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Codex => "Install Codex: npm install -g @openai/codex",
        BackendKind::Cline => "Install the Cline CLI and make sure `cline` is on PATH",
        BackendKind::Claude => "Install Claude: https://claude.ai/download",
    }
}
