//! Tracing setup for the CLI.
//!
//! Events go to stderr so they never interleave with the PASS/FAIL lines on
//! stdout. A log file, when configured, gets its own level and source
//! locations.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use wikiscript_core::config::types::LoggingConfig;

static FILE_GUARD: Mutex<Option<WorkerGuard>> = Mutex::new(None);

pub fn init(cfg: &LoggingConfig) -> io::Result<()> {
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter(level(&cfg.level, LevelFilter::INFO)));

    let file = match &cfg.file {
        Some(path) => {
            let file_level = cfg.file_level.as_deref().unwrap_or(&cfg.level);
            let layer = fmt::layer()
                .with_writer(open_log(path)?)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter(level(file_level, LevelFilter::DEBUG)));
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(())
}

/// Drop the file writer's guard so buffered lines reach disk.
/// `std::process::exit` does not run destructors.
pub fn flush() {
    if let Ok(mut guard) = FILE_GUARD.lock() {
        guard.take();
    }
}

/// Open the log file behind a non-blocking writer whose guard lives until
/// [`flush`].
fn open_log(path: &Path) -> io::Result<NonBlocking> {
    let file = File::create(path)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    if let Ok(mut slot) = FILE_GUARD.lock() {
        *slot = Some(guard);
    }
    Ok(writer)
}

/// `RUST_LOG` wins over the configured level.
fn filter(default: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(default.into()).from_env_lossy()
}

fn level(name: &str, fallback: LevelFilter) -> LevelFilter {
    name.trim().parse().unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(level("error", LevelFilter::INFO), LevelFilter::ERROR);
        assert_eq!(level("WARN", LevelFilter::INFO), LevelFilter::WARN);
        assert_eq!(level(" Debug ", LevelFilter::INFO), LevelFilter::DEBUG);
        assert_eq!(level("off", LevelFilter::INFO), LevelFilter::OFF);
    }

    #[test]
    fn test_unknown_level_uses_fallback() {
        assert_eq!(level("loud", LevelFilter::INFO), LevelFilter::INFO);
        assert_eq!(level("verbose", LevelFilter::DEBUG), LevelFilter::DEBUG);
    }

    #[test]
    fn test_open_log_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("run.log");
        let err = open_log(&path).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("run.log"), "{err}");
    }
}
