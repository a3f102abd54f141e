// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Size and modification time of an input file, used to detect whether the
/// file changed underneath an existing checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    pub size_bytes: u64,
    pub mtime_nanoseconds: i128,
}

impl FileSignature {
    pub fn of(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let mtime = meta
            .modified()?
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Ok(Self {
            size_bytes: meta.len(),
            mtime_nanoseconds: mtime.as_nanos() as i128,
        })
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
