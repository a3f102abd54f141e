// SPDX-License-Identifier: MIT

//! Log rotation and subscriber setup. Logs go to both stdout and a rotating
//! file under `log_dir`, as required by the worker's operational contract.

use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_NAME: &str = "transcription_worker.log";

/// Bytes above which the log file is rotated at startup.
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated generations kept (`.log.1` .. `.log.3`).
const MAX_ROTATED_LOGS: u32 = 3;

/// Shift `transcription_worker.log` -> `.log.1` -> `.log.2` -> `.log.3`,
/// dropping the oldest, if the current log has grown past [`MAX_LOG_SIZE`].
/// Best-effort: a rotation failure never stops the worker from starting.
pub fn rotate_log_if_needed(log_dir: &Path) {
    let log_path = log_dir.join(LOG_FILE_NAME);
    let size = match std::fs::metadata(&log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(&log_path, format!("{log_str}.1"));
}

/// Install a global subscriber that writes structured logs to stdout and to
/// `log_dir/transcription_worker.log`. The returned guard must be held for
/// the process lifetime; dropping it stops the background log-flushing
/// thread and can truncate buffered output.
pub fn setup_logging(
    log_dir: &Path,
    log_level: &str,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
