// SPDX-License-Identifier: MIT

//! Shared data model and configuration for the transcription worker.
//!
//! This crate has no I/O of its own: it defines the types that flow between
//! `tw-storage`, `tw-adapters`, `tw-engine`, and the daemon binary, plus the
//! environment-driven configuration loader.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod checkpoint;
mod config;
mod segment;
mod signature;
mod time;

pub use checkpoint::{CheckpointRecord, CheckpointState};
pub use config::{Config, ConfigError};
pub use segment::{segment_key, Segment, SegmentKey};
pub use signature::FileSignature;
pub use time::{fmt_hhmmss, utc_now_iso};
