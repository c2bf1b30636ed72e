//! Activity logging.
//!
//! The organizer never talks to a global logger directly. It is handed an
//! [`ActivityLog`] by its caller; the binary wires that to `tracing` and an
//! append-only log file, tests wire it to a [`MemoryLog`].

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Timestamp format used in the log file.
const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Sink for per-file organization records.
pub trait ActivityLog {
    fn record(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.record(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::ERROR, message);
    }
}

/// Forwards records to `tracing` under the `sortbox::activity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ActivityLog for TracingLog {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "sortbox::activity", "{message}"),
            Level::WARN => tracing::warn!(target: "sortbox::activity", "{message}"),
            Level::INFO => tracing::info!(target: "sortbox::activity", "{message}"),
            Level::DEBUG => tracing::debug!(target: "sortbox::activity", "{message}"),
            _ => tracing::trace!(target: "sortbox::activity", "{message}"),
        }
    }
}

/// Keeps every record in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: RefCell<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Messages recorded at exactly `level`.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl ActivityLog for MemoryLog {
    fn record(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Installs the global subscriber: an append-only file layer plus a stderr
/// layer for warnings (or debug output when `verbose`).
///
/// `RUST_LOG` overrides the file layer's default `info` filter. The returned
/// guard must be held until the program exits so buffered lines are flushed.
pub fn setup_logging(log_dir: &Path, file_name: &str, verbose: bool) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_filter(file_filter);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_level(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::info!(
        "Logging initialized: file={}, verbose={}",
        log_dir.join(file_name).display(),
        verbose
    );

    Ok(guard)
}

/// Console-only fallback used when the log file cannot be opened.
pub fn setup_console_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_filter(console_level(verbose)),
        )
        .try_init()
        .context("Failed to install log subscriber")
}
