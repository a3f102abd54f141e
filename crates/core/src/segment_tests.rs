// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn key_rounds_to_milliseconds() {
    let a = segment_key(1.0004, 2.0006, "hello");
    let b = segment_key(1.0001, 2.0009, "hello");
    assert_eq!(a, b);
}

#[test]
fn key_trims_text() {
    let a = segment_key(0.0, 1.0, "  hello  ");
    let b = segment_key(0.0, 1.0, "hello");
    assert_eq!(a, b);
}

#[test]
fn key_distinguishes_different_text() {
    let a = segment_key(0.0, 1.0, "hello");
    let b = segment_key(0.0, 1.0, "world");
    assert_ne!(a, b);
}
