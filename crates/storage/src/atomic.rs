// SPDX-License-Identifier: MIT

use crate::StorageError;
use serde::Serialize;
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Abstracts the filesystem operations behind an atomic write, so tests can
/// inject faults (crash mid-write, rename failure) without touching a real
/// disk.
pub trait AtomicWriter: Send + Sync + 'static {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;
    fn fsync_file(&self, path: &Path) -> Result<(), StorageError>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn exists(&self, path: &Path) -> bool;
}

/// Production writer backed by real filesystem calls.
#[derive(Debug, Clone, Default)]
pub struct FsAtomicWriter;

impl AtomicWriter for FsAtomicWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let mut file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        file.write_all(data).map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StorageError> {
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        file.sync_all().map_err(|e| StorageError::io(path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        std::fs::rename(from, to).map_err(|e| StorageError::io(to, e))
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Sibling temp path in the same directory as `path`, e.g. `a.json` →
/// `a.json.tmp`.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

fn write_atomic<W: AtomicWriter + ?Sized>(
    writer: &W,
    path: &Path,
    data: &[u8],
) -> Result<(), StorageError> {
    let tmp = tmp_path_for(path);
    writer.write_tmp(&tmp, data)?;
    writer.fsync_file(&tmp)?;
    writer.rename(&tmp, path)
}

/// Write `text` to `path` via write-temp-then-rename.
pub fn write_text<W: AtomicWriter + ?Sized>(
    writer: &W,
    path: &Path,
    text: &str,
) -> Result<(), StorageError> {
    write_atomic(writer, path, text.as_bytes())
}

/// Write `value` to `path` as pretty, stably-keyed JSON with a trailing
/// newline, via write-temp-then-rename.
///
/// `serde_json`'s default `Map` is backed by a `BTreeMap` (the
/// `preserve_order` feature is not enabled), so object keys already come out
/// sorted; this is what gives two semantically-equal snapshots identical
/// bytes.
pub fn write_json<W: AtomicWriter + ?Sized, T: Serialize>(
    writer: &W,
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    let mut buf = serde_json::to_vec_pretty(value)?;
    buf.push(b'\n');
    write_atomic(writer, path, &buf)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
