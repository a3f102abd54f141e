// SPDX-License-Identifier: MIT

use super::*;
use std::io::Write;

#[test]
fn signature_changes_when_content_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    {
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"hello").unwrap();
    }
    let sig1 = FileSignature::of(&path).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(10));
    {
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"hello world").unwrap();
    }
    let sig2 = FileSignature::of(&path).unwrap();

    assert_ne!(sig1, sig2);
    assert_eq!(sig2.size_bytes, 11);
}
