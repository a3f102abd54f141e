// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A single transcribed span of audio reported by the transcription service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// The identity of a [`Segment`] for deduplication purposes: start and end
/// rounded to milliseconds, paired with the trimmed text.
pub type SegmentKey = (i64, i64, String);

/// Compute the dedup key for a segment: `(round(start,3), round(end,3), trimmed text)`.
///
/// Rounding is done in millisecond integers rather than floats so the key is
/// hashable and exactly comparable.
pub fn segment_key(start: f64, end: f64, text: &str) -> SegmentKey {
    (round_millis(start), round_millis(end), text.trim().to_string())
}

fn round_millis(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
