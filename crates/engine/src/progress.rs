// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::info;
use tw_core::fmt_hhmmss;

/// The small, frequently-updated snapshot the ingestion task publishes for
/// the progress reporter to read. Mutated under a lock; the segment map
/// itself is never shared this way (§5).
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub segments_done: usize,
    pub last_end_sec: Option<f64>,
    pub last_event_at: Instant,
}

/// Shared handle the ingestion task and the reporter task both hold.
#[derive(Clone)]
pub struct ProgressShared(Arc<Mutex<ProgressSnapshot>>);

impl ProgressShared {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(ProgressSnapshot {
            segments_done: 0,
            last_end_sec: None,
            last_event_at: Instant::now(),
        })))
    }

    /// Called by the ingestion task after each event. Never blocks on
    /// anything but this uncontended lock.
    pub fn update(&self, segments_done: usize, last_end_sec: Option<f64>) {
        let mut guard = self.0.lock();
        guard.segments_done = segments_done;
        guard.last_end_sec = last_end_sec;
        guard.last_event_at = Instant::now();
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.0.lock()
    }
}

impl Default for ProgressShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs until `done_rx` fires, emitting one progress line every
/// `log_every`. Spawned and joined inside the owning session's scope; it
/// never outlives the session.
pub async fn run_progress_reporter(
    shared: ProgressShared,
    log_every: Duration,
    duration_hint: Option<f64>,
    started_at: Instant,
    mut done_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(log_every) => {
                let snapshot = shared.snapshot();
                info!("{}", format_progress_line(&snapshot, duration_hint, started_at.elapsed()));
            }
            _ = &mut done_rx => {
                break;
            }
        }
    }
}

/// Pure formatting for the periodic progress line: elapsed time, percent
/// complete when duration is known, and the stall delta since the last
/// event.
fn format_progress_line(snapshot: &ProgressSnapshot, duration_hint: Option<f64>, elapsed: Duration) -> String {
    let stall = snapshot.last_event_at.elapsed();
    let elapsed_str = fmt_hhmmss(elapsed.as_secs_f64());

    match (duration_hint, snapshot.last_end_sec) {
        (Some(duration), Some(last_end)) if duration > 0.0 => {
            let pct = (last_end / duration * 100.0).clamp(0.0, 100.0);
            format!(
                "progress: {} segments, {:.1}% ({} / {}), elapsed {}, stall {:.1}s",
                snapshot.segments_done,
                pct,
                fmt_hhmmss(last_end),
                fmt_hhmmss(duration),
                elapsed_str,
                stall.as_secs_f64(),
            )
        }
        _ => format!(
            "progress: {} segments, elapsed {}, stall {:.1}s",
            snapshot.segments_done,
            elapsed_str,
            stall.as_secs_f64(),
        ),
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
