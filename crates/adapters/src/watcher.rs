// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// List files in `dir` that match `supported_extensions` and are not already
/// marked processed or failed, sorted by lowercased name for deterministic
/// ordering across polls.
pub fn list_candidate_files(dir: &Path, supported_extensions: &BTreeSet<String>) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| is_candidate(path, supported_extensions))
        .collect();

    candidates.sort_by_key(|path| {
        path.file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    candidates
}

fn is_candidate(path: &Path, supported_extensions: &BTreeSet<String>) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with("processed_") || name.starts_with("failed_") || name.starts_with("deleted_") {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    supported_extensions.contains(&ext)
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
