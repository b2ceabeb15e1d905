// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingLevel;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber: stderr always, plus `log_file` when set.
///
/// `RUST_LOG` replaces the configured level entirely.
pub(crate) fn init(level: LoggingLevel, log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "warn,stage1={level},stage1_core={level},stage1_sys={level}",
            level = level.as_directive()
        ))
        .context("building log filter")?,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let file_layer = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            // Keep the background writer alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}

fn file_writer(
    path: &Path,
) -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;

    fs::create_dir_all(dir)
        .with_context(|| format!("create log directory failed: {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
