// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Records operations on a simulated filesystem and supports injecting a
/// failure after any step, so callers can verify that a crash mid-save never
/// leaves a torn file (P3).
#[derive(Default)]
struct FakeWriter {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_after_write: AtomicBool,
    fail_after_fsync: AtomicBool,
    fail_rename: AtomicBool,
}

impl FakeWriter {
    fn seed(&self, path: &Path, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
    }

    fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl AtomicWriter for FakeWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        if self.fail_after_write.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                path,
                std::io::Error::other("injected write failure"),
            ));
        }
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StorageError> {
        if self.fail_after_fsync.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                path,
                std::io::Error::other("injected fsync failure"),
            ));
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if self.fail_rename.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                to,
                std::io::Error::other("injected rename failure"),
            ));
        }
        let data = self.files.lock().unwrap().remove(from);
        if let Some(data) = data {
            self.files.lock().unwrap().insert(to.to_path_buf(), data);
        }
        Ok(())
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

#[test]
fn write_text_goes_through_tmp_then_rename() {
    let writer = FakeWriter::default();
    let target = PathBuf::from("/data/checkpoints/a.txt");
    write_text(&writer, &target, "hello").unwrap();

    assert_eq!(writer.get(&target), Some(b"hello".to_vec()));
    assert_eq!(writer.get(&PathBuf::from("/data/checkpoints/a.txt.tmp")), None);
}

#[test]
fn write_json_sorts_keys_and_trailing_newline() {
    let writer = FakeWriter::default();
    let target = PathBuf::from("/data/checkpoints/a.json");
    let value = serde_json::json!({"b": 1, "a": 2});
    write_json(&writer, &target, &value).unwrap();

    let bytes = writer.get(&target).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.ends_with('\n'));
    assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
}

#[test]
fn failed_write_leaves_prior_file_untouched() {
    let writer = FakeWriter::default();
    let target = PathBuf::from("/data/checkpoints/a.txt");
    writer.seed(&target, b"old");
    writer.fail_after_write.store(true, Ordering::SeqCst);

    let err = write_text(&writer, &target, "new").unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    assert_eq!(writer.get(&target), Some(b"old".to_vec()));
}

#[test]
fn failed_fsync_does_not_rename_over_target() {
    let writer = FakeWriter::default();
    let target = PathBuf::from("/data/checkpoints/a.txt");
    writer.seed(&target, b"old");
    writer.fail_after_fsync.store(true, Ordering::SeqCst);

    let err = write_text(&writer, &target, "new").unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    assert_eq!(writer.get(&target), Some(b"old".to_vec()));
}

#[test]
fn failed_rename_leaves_target_as_old_bytes() {
    let writer = FakeWriter::default();
    let target = PathBuf::from("/data/checkpoints/a.txt");
    writer.seed(&target, b"old");
    writer.fail_rename.store(true, Ordering::SeqCst);

    let err = write_text(&writer, &target, "new").unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    assert_eq!(writer.get(&target), Some(b"old".to_vec()));
}

#[test]
fn fs_writer_round_trips_through_real_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.json");
    let value = serde_json::json!({"z": 1, "a": [1, 2, 3]});
    write_json(&FsAtomicWriter, &path, &value).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let roundtrip: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(roundtrip, value);
    assert!(!dir.path().join("rec.json.tmp").exists());
}
