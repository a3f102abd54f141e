// SPDX-License-Identifier: MIT

//! External collaborators the engine drives but does not own: the media
//! toolkit subprocess, the transcription HTTP client, the SSE framer, and
//! the input-directory poller.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod media;
mod sse;
mod transcribe;
mod watcher;

pub use media::{MediaError, MediaHelper};
pub use sse::{SseEvent, SseReader};
pub use transcribe::{TranscribeClient, TranscribeError, TranscribeRequest};
pub use watcher::list_candidate_files;
