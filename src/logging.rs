//! Diagnostic logging setup.
//!
//! Logs go to stderr so that stdout carries only command output (and stays
//! parseable with `--json`).

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `-v`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(3), "trace");
        assert_eq!(level_for_verbosity(200), "trace");
    }

    #[test]
    fn repeated_init_is_ignored() {
        init_tracing(0);
        init_tracing(2);
    }
}
