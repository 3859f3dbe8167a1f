//! Tracing setup.
//!
//! The terminal is owned by the map while it runs, so interactive sessions
//! log to a file or not at all. Stderr is only useful for the export mode.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

/// Default filter for a `-v` count; `RUST_LOG` overrides it
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when logging is disabled or a subscriber was already set.
pub fn init_tracing(target: &LogTarget, verbosity: u8) -> Result<bool> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let installed = match target {
        LogTarget::Disabled => false,
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok(),
        LogTarget::File(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create log file: {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .is_ok()
        }
    };
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "info");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(7), "trace");
    }

    #[test]
    fn test_disabled_installs_nothing() {
        assert!(!init_tracing(&LogTarget::Disabled, 3).unwrap());
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = LogTarget::File(dir.path().join("missing").join("app.log"));
        assert!(init_tracing(&target, 0).is_err());
    }
}
