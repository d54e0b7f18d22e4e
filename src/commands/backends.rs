//! Implementation of the `agentrun backends` command.

use crate::agent::BackendKind;
use crate::config::Config;
use crate::error::Result;

/// Effective settings of one backend, as shown by `agentrun backends`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRow {
    pub name: &'static str,
    pub strategy: String,
    pub binary: String,
    pub timeout_seconds: u64,
    pub supports_model: bool,
    pub is_default: bool,
}

/// Rows for every known backend, after config overrides.
pub fn backend_rows(config: &Config) -> Vec<BackendRow> {
    BackendKind::ALL
        .into_iter()
        .map(|kind| {
            let settings = config.settings_for(kind, None);
            BackendRow {
                name: kind.name(),
                strategy: kind.strategy().to_string(),
                binary: settings.binary,
                timeout_seconds: settings.timeout.as_secs(),
                supports_model: kind.supports_model(),
                is_default: config.default_backend == Some(kind),
            }
        })
        .collect()
}

/// Execute the `agentrun backends` command.
pub fn cmd_backends(config: &Config) -> Result<()> {
    let rows = backend_rows(config);

    println!("Backends ({}):", rows.len());
    println!();

    for row in &rows {
        println!(
            "  {}{}:",
            row.name,
            if row.is_default { " (default)" } else { "" }
        );
        println!("    Strategy:   {}", row.strategy);
        println!("    Binary:     {}", row.binary);
        println!("    Timeout:    {}s", row.timeout_seconds);
        println!(
            "    Model:      {}",
            if row.supports_model {
                "supported"
            } else {
                "ignored"
            }
        );
        println!();
    }

    println!("Run `agentrun doctor` to check which binaries are available.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_use_backend_defaults() {
        let rows = backend_rows(&Config::default());

        let names: Vec<_> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, ["codex", "cline", "claude"]);

        assert_eq!(rows[0].strategy, "pipe");
        assert_eq!(rows[0].timeout_seconds, 600);
        assert!(rows[0].supports_model);

        assert_eq!(rows[1].binary, "cline");
        assert!(!rows[1].supports_model);

        assert_eq!(rows[2].strategy, "pty");
        assert_eq!(rows[2].timeout_seconds, 1800);
        assert!(rows.iter().all(|r| !r.is_default));
    }

    #[test]
    fn rows_reflect_config_overrides() {
        let config = Config::from_yaml(
            r#"
default_backend: claude
backends:
  claude:
    binary: /opt/claude/bin/claude
    timeout_seconds: 90
"#,
        )
        .unwrap();

        let rows = backend_rows(&config);
        let claude = rows.iter().find(|r| r.name == "claude").unwrap();
        assert!(claude.is_default);
        assert_eq!(claude.binary, "/opt/claude/bin/claude");
        assert_eq!(claude.timeout_seconds, 90);
    }
}
