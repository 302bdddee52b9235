// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always goes to stderr so that stdout stays free for
//! simulation records. With the `file-logging` feature, each run also gets a
//! timestamped folder of JSON logs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Prefix of per-run log folders: `run_20250101_120000`
const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Filter combining per-crate debug flags with the base level
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

fn console_layer<S>(format: LogFormat, filter: EnvFilter) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);
    match format {
        LogFormat::Text => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
    }
}

/// Install a global console subscriber
///
/// # Errors
/// Fails if the level is not a valid filter or a global subscriber is
/// already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(debug_flags, &config.level)?;
    Registry::default()
        .with(console_layer(config.format, filter))
        .try_init()
        .context("Failed to install console logging")
}

/// Logging initialization result; log files are flushed when it is dropped
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// The folder of this run
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Initialize console logging plus per-run log files
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── dendrosim-engine.log
///       ├── dendrosim-neural.log
///       └── dendrosim.log (combined)
/// ```
#[cfg(feature = "file-logging")]
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    use tracing_appender::rolling;

    let timestamp = Utc::now().format(RUN_TIMESTAMP);
    let run_folder = config.log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&config.log_dir, config.retention_days, config.retention_runs)?;

    let mut layers = vec![console_layer(config.format, build_filter(debug_flags, &config.level)?)];
    let mut file_guards = Vec::new();

    // One file per crate, holding only that crate's events
    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guards.push(guard);

        let only_crate = EnvFilter::try_new(format!("{}=debug", crate::crate_target(crate_name)))
            .with_context(|| format!("Invalid log filter for {}", crate_name))?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(only_crate)
                .boxed(),
        );
    }

    let combined_appender = rolling::daily(&run_folder, "dendrosim.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    file_guards.push(combined_guard);
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_filter(debug_flags, &config.level)?)
            .boxed(),
    );

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install file logging")?;

    Ok(LoggingGuard {
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Remove run folders older than `retention_days`, then all but the newest
/// `retention_runs`. Returns the removed folders.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<Vec<PathBuf>> {
    if !base_log_dir.exists() {
        return Ok(Vec::new());
    }

    let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|s| chrono::NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP).ok());
        if let Some(naive) = stamp {
            runs.push((path, Utc.from_utc_datetime(&naive)));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = Vec::new();
    for (rank, (path, started)) in runs.into_iter().enumerate() {
        if started >= cutoff && rank < retention_runs {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed.push(path),
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}
