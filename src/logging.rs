//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file (or not at
//! all); export runs log to stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `filter`; an invalid filter falls back to `info`.
/// Calling this more than once keeps the first subscriber.
pub fn init_logging(filter: &str, target: &LogTarget) {
    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")),
        |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let result = match target {
        LogTarget::Disabled => return,
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogTarget::File(path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("Failed to open log file {}: {}", path.display(), err);
                    return;
                }
            };
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    if let Err(err) = result {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = LogTarget::File(dir.path().join("doctor.log"));
        init_logging("debug", &target);
        init_logging("not a valid filter [", &target);
        init_logging("info", &LogTarget::Disabled);
        assert!(dir.path().join("doctor.log").exists());
    }
}
