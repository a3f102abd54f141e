// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::BTreeMap;
use tw_core::{segment_key, Segment, SegmentKey};

/// Parameters that vary the merge behavior between a from-scratch attempt
/// and a resume attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeParams {
    /// Added to every incoming segment's `start`/`end` before insertion.
    pub resume_offset_sec: f64,
    /// Segments whose shifted `end` falls at or below this (plus epsilon)
    /// are dropped as re-transcribed overlap.
    pub drop_ends_leq_sec: Option<f64>,
}

const OVERLAP_EPSILON: f64 = 0.05;

/// The segment accumulator a transcription session merges events into.
///
/// Commutative under insertion: feeding the same events in any order
/// produces the same final map (P1), since insertion is keyed by
/// `(start, end, text)` and later writes for an existing key simply
/// overwrite in place.
#[derive(Debug, Clone, Default)]
pub struct SegmentMap {
    by_key: BTreeMap<SegmentKey, Segment>,
}

impl SegmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a map from a checkpoint's persisted segment list.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut map = Self::new();
        for seg in segments {
            map.insert(seg);
        }
        map
    }

    pub fn insert(&mut self, segment: Segment) {
        let key = segment_key(segment.start, segment.end, &segment.text);
        self.by_key.insert(key, segment);
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Maximum `end` across all segments, or `None` when empty (I2's
    /// source of truth before persistence).
    pub fn last_end_sec(&self) -> Option<f64> {
        self.by_key.values().map(|s| s.end).fold(None, |acc, e| {
            Some(acc.map_or(e, |a: f64| a.max(e)))
        })
    }

    /// Segments in canonical `(start, end)` emission order.
    pub fn sorted(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self.by_key.values().cloned().collect();
        segments.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.end.partial_cmp(&b.end).unwrap_or(std::cmp::Ordering::Equal))
        });
        segments
    }

    /// Space-joined, trimmed transcript in emission order (§9 open question).
    pub fn transcript(&self) -> String {
        self.sorted()
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Apply one SSE `data:` JSON payload to `map`. Returns the event's `text`
/// field, if present, to update the session's `latest_text`.
///
/// Malformed payloads (non-JSON, wrong shapes) are silently ignored at the
/// event level per the protocol-invalid error policy — they never abort the
/// attempt.
pub fn apply_event(map: &mut SegmentMap, payload: &str, params: &MergeParams) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let obj = value.as_object()?;

    let latest_text = obj
        .get("text")
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    if let Some(segments) = obj.get("segments").and_then(Value::as_array) {
        for raw in segments {
            let Some(seg) = parse_raw_segment(raw) else {
                continue;
            };
            if let Some(segment) = apply_shift_and_filter(seg, params) {
                map.insert(segment);
            }
        }
    }

    latest_text
}

fn parse_raw_segment(raw: &Value) -> Option<Segment> {
    let obj = raw.as_object()?;
    let start = coerce_f64(obj.get("start"));
    let end = coerce_f64(obj.get("end"));
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();
    Some(Segment { start, end, text })
}

fn coerce_f64(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn apply_shift_and_filter(mut segment: Segment, params: &MergeParams) -> Option<Segment> {
    if params.resume_offset_sec > 0.0 {
        segment.start += params.resume_offset_sec;
        segment.end += params.resume_offset_sec;
    }
    if let Some(drop_ends_leq) = params.drop_ends_leq_sec {
        if segment.end <= drop_ends_leq + OVERLAP_EPSILON {
            return None;
        }
    }
    Some(segment)
}

#[cfg(test)]
#[path = "merger_tests.rs"]
mod tests;
