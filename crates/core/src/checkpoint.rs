// SPDX-License-Identifier: MIT

use crate::{FileSignature, Segment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The driver state a checkpoint currently records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointState {
    Pending,
    InProgress,
    Interrupted,
    FailedAttempt,
    PermanentFailed,
}

impl fmt::Display for CheckpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckpointState::Pending => "pending",
            CheckpointState::InProgress => "in_progress",
            CheckpointState::Interrupted => "interrupted",
            CheckpointState::FailedAttempt => "failed_attempt",
            CheckpointState::PermanentFailed => "permanent_failed",
        };
        f.write_str(s)
    }
}

/// The on-disk, per-input-file progress document.
///
/// `extra` preserves any JSON keys this version of the worker does not know
/// about, so a load/save round-trip never drops fields written by a newer
/// build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub version: u32,
    pub file_name: String,
    pub file_path: String,
    pub file_signature: FileSignature,
    pub state: CheckpointState,
    pub attempts: u32,
    pub created_at: String,
    pub updated_at: String,
    pub segments: Vec<Segment>,
    pub last_end_sec: Option<f64>,
    pub latest_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Current checkpoint schema version written by this worker.
pub const CHECKPOINT_VERSION: u32 = 1;

impl CheckpointRecord {
    /// Build a fresh `pending` record for a newly-discovered input file.
    pub fn fresh(file_name: &str, file_path: &str, signature: FileSignature) -> Self {
        let now = crate::utc_now_iso();
        Self {
            version: CHECKPOINT_VERSION,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            file_signature: signature,
            state: CheckpointState::Pending,
            attempts: 0,
            created_at: now.clone(),
            updated_at: now,
            segments: Vec::new(),
            last_end_sec: None,
            latest_text: String::new(),
            last_error: None,
            extra: Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = crate::utc_now_iso();
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
