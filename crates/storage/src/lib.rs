// SPDX-License-Identifier: MIT

//! Crash-safe persistence for the transcription worker.
//!
//! Two layers: [`atomic`] provides write-temp-then-rename primitives for
//! text and JSON, and [`checkpoint`] builds the per-input-file progress
//! store on top of it.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod atomic;
mod checkpoint;
mod error;

pub use atomic::{write_json, write_text, AtomicWriter, FsAtomicWriter};
pub use checkpoint::{percent_encode, soft_delete, CheckpointStore};
pub use error::StorageError;
