//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Console output for progress and diagnostics
//! - Optional file logging through a non-blocking writer
//! - Configuration file based log level control, overridable with `RUST_LOG`
//! - Local-time timestamps with millisecond precision

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the file writer alive for the lifetime of the process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Dependencies that are only interesting at TRACE level
const NOISY_TARGETS: [(&str, &str); 5] = [
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("html5ever", "warn"),
    ("selectors", "warn"),
];

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured filter
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    configured_filter(config)
}

/// Configured level with dependency noise suppressed below TRACE, plus module filters
fn configured_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(format!("{}={}", target, level).parse()?);
        }
    }

    for (target, level) in &config.module_filters {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }

    Ok(filter)
}

/// Open `<log_dir>/<file_name>` behind a non-blocking writer
fn open_log_file(log_dir: &Path, file_name: &str) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

    let file_appender = rolling::never(log_dir, file_name);
    Ok(non_blocking(file_appender))
}

/// Initialize logging with custom configuration
///
/// A log file that cannot be opened downgrades to console-only logging
/// instead of failing.
///
/// # Environment Variable Override
/// ```bash
/// # Show detailed HTTP logs
/// RUST_LOG="debug,reqwest=debug,hyper=debug" timacad-crawler
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    init_logging_in(config, &get_log_directory())
}

fn init_logging_in(config: &LoggingConfig, log_dir: &Path) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let env_filter = build_env_filter(config)?;

    let (file_writer, file_error) = if config.file_output {
        match open_log_file(log_dir, &config.file_name) {
            Ok((writer, guard)) => {
                LOG_GUARDS
                    .lock()
                    .map_err(|_| anyhow!("Log guard registry poisoned"))?
                    .push(guard);
                (Some(writer), None)
            }
            Err(e) => (None, Some(e)),
        }
    } else {
        (None, None)
    };

    let file_layer = file_writer.map(|writer| {
        fmt::Layer::new()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_ansi(false)
    });

    let console_layer = (config.console_output || file_error.is_some()).then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    match file_error {
        Some(e) => warn!("⚠️ File logging disabled, using console only: {:#}", e),
        None if config.file_output => info!("Log file: {:?}", log_dir.join(&config.file_name)),
        None => {}
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Timacad Crawler System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("==========================================");
}
