//! Display and reporting functions for the doctor command.

use super::{CheckStatus, DoctorReport};
use crate::error::{AgentrunError, Result};

/// Print the doctor report.
pub fn print_report(report: &DoctorReport) {
    println!("Checks ({}):", report.checks.len());
    println!();

    for check in &report.checks {
        println!("  [{}] {} - {}", check.status, check.name, check.detail);

        if let Some(remediation) = &check.remediation {
            println!(
                "       Fix:  {}",
                remediation.lines().next().unwrap_or(remediation)
            );
            for line in remediation.lines().skip(1) {
                println!("             {}", line);
            }
        }
    }

    println!();

    let failed = report
        .checks
        .iter()
        .filter(|c| c.status == CheckStatus::Fail)
        .count();
    let backends = report.available_backends();

    if report.is_healthy() {
        println!(
            "Environment is usable. Available backends: {}.",
            backends.join(", ")
        );
    } else {
        println!(
            "Summary: {} check(s) failed. Agents need at least one backend and a running container runtime.",
            failed
        );
    }
}

/// Print the report as pretty JSON, with a top-level `healthy` flag.
pub fn print_json(report: &DoctorReport) -> Result<()> {
    println!("{}", report_json(report)?);
    Ok(())
}

pub fn report_json(report: &DoctorReport) -> Result<String> {
    let value = serde_json::json!({
        "healthy": report.is_healthy(),
        "available_backends": report.available_backends(),
        "checks": report.checks,
    });
    serde_json::to_string_pretty(&value)
        .map_err(|e| AgentrunError::UserError(format!("failed to serialize doctor report: {}", e)))
}
