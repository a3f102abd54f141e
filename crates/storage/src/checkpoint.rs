// SPDX-License-Identifier: MIT

use crate::{write_json, AtomicWriter, FsAtomicWriter, StorageError};
use std::path::{Path, PathBuf};
use tw_core::{utc_now_iso, CheckpointRecord};

/// Percent-encode a file name for use as a checkpoint file name: letters,
/// digits, `-`, `_`, and `.` pass through unchanged, everything else
/// (including `/` and `\`) is escaped as `%XX`.
pub fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Typed load/save access to the per-input-file checkpoint documents.
pub struct CheckpointStore<W: AtomicWriter = FsAtomicWriter> {
    dir: PathBuf,
    writer: W,
}

impl CheckpointStore<FsAtomicWriter> {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_writer(dir, FsAtomicWriter)
    }
}

impl<W: AtomicWriter> CheckpointStore<W> {
    pub fn with_writer(dir: PathBuf, writer: W) -> Self {
        Self { dir, writer }
    }

    /// Path a checkpoint for `input_name` would live at.
    pub fn path_for(&self, input_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", percent_encode(input_name)))
    }

    /// Load a checkpoint record. Any parse error or missing file is treated
    /// as "absent" rather than propagated — the driver starts fresh either
    /// way (I4).
    pub fn load(&self, path: &Path) -> Option<CheckpointRecord> {
        let bytes = self.writer.read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Atomically persist a checkpoint record.
    pub fn save(&self, path: &Path, record: &CheckpointRecord) -> Result<(), StorageError> {
        write_json(&self.writer, path, record)
    }

    /// Scan the checkpoint directory for records that are corrupt or whose
    /// source file no longer exists, and soft-rename them out of the way so
    /// they stop being picked up as active checkpoints without being
    /// destroyed.
    pub fn cleanup_orphans(&self) -> std::io::Result<usize> {
        let mut cleaned = 0;
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let is_orphan = match self.load(&path) {
                None => true,
                Some(record) => !Path::new(&record.file_path).exists(),
            };

            if is_orphan {
                soft_delete(&path)?;
                cleaned += 1;
            }
        }
        Ok(cleaned)
    }
}

/// Rename `path` to `deleted_<timestamp>_<name>` in the same directory,
/// rather than unlinking it, so operators can recover from an over-eager
/// cleanup.
pub fn soft_delete(path: &Path) -> std::io::Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stamp = utc_now_iso().replace([':', '-'], "");
    let dest = parent.join(format!("deleted_{stamp}_{name}"));
    std::fs::rename(path, &dest)?;
    Ok(dest)
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
