// SPDX-License-Identifier: MIT

//! Startup sequence: directory creation, transcription endpoint readiness,
//! and cleanup of state left behind by a previous run.

use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{info, warn};
use tw_core::Config;
use tw_storage::CheckpointStore;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid WHISPER_URL: {0}")]
    InvalidUrl(String),
    #[error("transcription endpoint at {host}:{port} did not become reachable within {timeout:?}")]
    ServerUnreachable {
        host: String,
        port: u16,
        timeout: Duration,
    },
}

/// Create every configured directory (input, output, logs, checkpoints, temp).
pub fn create_directories(config: &Config) -> std::io::Result<()> {
    for dir in [
        &config.input_dir,
        &config.output_dir,
        &config.log_dir,
        &config.checkpoint_dir,
        &config.temp_dir,
    ] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Remove every entry under `temp_dir`, recreating the (now-empty) directory.
/// Best-effort per entry: one unremovable file does not abort startup.
pub fn wipe_temp_dir(temp_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(temp_dir)?;
    for entry in std::fs::read_dir(temp_dir)?.flatten() {
        let path = entry.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "could not remove stale temp entry");
        }
    }
    Ok(())
}

/// Soft-rename any checkpoint whose input file no longer exists or whose JSON
/// is corrupt, so a previous crash doesn't leave unreadable state behind.
pub fn cleanup_orphan_checkpoints(checkpoints: &CheckpointStore) -> std::io::Result<usize> {
    checkpoints.cleanup_orphans()
}

/// Poll the transcription endpoint's TCP port until it accepts a connection
/// or `timeout` elapses, retrying every few seconds.
pub async fn wait_for_server_ready(url: &str, timeout: Duration) -> Result<(), LifecycleError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| LifecycleError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| LifecycleError::InvalidUrl(url.to_string()))?
        .to_string();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| LifecycleError::InvalidUrl(url.to_string()))?;

    let deadline = tokio::time::Instant::now() + timeout;
    let poll_every = Duration::from_secs(3);

    loop {
        match TcpStream::connect((host.as_str(), port)).await {
            Ok(_) => {
                info!(host, port, "transcription endpoint is reachable");
                return Ok(());
            }
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(poll_every.min(deadline - tokio::time::Instant::now())).await;
            }
            Err(_) => {
                return Err(LifecycleError::ServerUnreachable { host, port, timeout });
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
