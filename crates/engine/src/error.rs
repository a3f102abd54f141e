// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures that can end a single transcription attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("transient network failure: {0}")]
    Network(#[from] tw_adapters::TranscribeError),
    #[error("media error: {0}")]
    Media(#[from] tw_adapters::MediaError),
    #[error("checkpoint write failed: {0}")]
    Checkpoint(#[from] tw_storage::StorageError),
    #[error("incomplete: covered {covered_pct:.1}% of {duration:.1}s (need {threshold:.1}%)")]
    Incomplete {
        covered_pct: f64,
        duration: f64,
        threshold: f64,
    },
    #[error("shutdown requested")]
    ShutdownRequested,
}

impl AttemptError {
    /// Whether this attempt should count against `max_retries` (everything
    /// except a cooperative shutdown).
    pub fn consumes_retry(&self) -> bool {
        !matches!(self, AttemptError::ShutdownRequested)
    }
}

/// Failures that can end processing of one input file entirely.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error("checkpoint write failed: {0}")]
    Checkpoint(#[from] tw_storage::StorageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
