// SPDX-License-Identifier: MIT

use crate::error::AttemptError;
use crate::merger::{apply_event, MergeParams, SegmentMap};
use crate::progress::{run_progress_reporter, ProgressShared};
use crate::stop::StopSignal;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tw_adapters::{SseEvent, TranscribeClient, TranscribeRequest};
use tw_core::{CheckpointRecord, CheckpointState};
use tw_storage::CheckpointStore;

/// Inputs that vary between a from-scratch attempt and a resume attempt.
pub struct SessionParams<'a> {
    pub model: &'a str,
    pub response_format: &'a str,
    pub stream: bool,
    pub language: Option<&'a str>,
    pub upload_path: &'a Path,
    pub resume_offset_sec: f64,
    pub drop_ends_leq_sec: Option<f64>,
    pub checkpoint_save_interval: Duration,
    pub progress_log_every: Duration,
    pub duration_hint: Option<f64>,
}

/// Run one POST+SSE round trip: open the upload, consume the response
/// through the merger, and periodically snapshot `record` to
/// `checkpoint_path`. Returns the final `latest_text` once the stream ends
/// naturally. The caller owns post-session validation and final
/// persistence.
pub async fn run_session(
    client: &TranscribeClient,
    checkpoints: &CheckpointStore,
    checkpoint_path: &Path,
    record: &mut CheckpointRecord,
    map: &mut SegmentMap,
    params: &SessionParams<'_>,
    stop: &StopSignal,
) -> Result<String, AttemptError> {
    let request = TranscribeRequest {
        model: params.model,
        response_format: params.response_format,
        stream: params.stream,
        language: params.language,
        file_path: params.upload_path,
    };
    let mut stream = client.start(&request).await?;

    let progress = ProgressShared::new();
    let (done_tx, done_rx) = oneshot::channel();
    let reporter = tokio::spawn(run_progress_reporter(
        progress.clone(),
        params.progress_log_every,
        params.duration_hint,
        Instant::now(),
        done_rx,
    ));

    let merge_params = MergeParams {
        resume_offset_sec: params.resume_offset_sec,
        drop_ends_leq_sec: params.drop_ends_leq_sec,
    };

    let mut latest_text = record.latest_text.clone();
    let mut last_snapshot_at = Instant::now();
    let mut dirty = false;

    let result = loop {
        if stop.is_set() {
            break Err(AttemptError::ShutdownRequested);
        }

        let events = match stream.next_events().await {
            Ok(Some(events)) => events,
            Ok(None) => break Ok(latest_text.clone()),
            Err(e) => break Err(AttemptError::from(e)),
        };

        let mut stream_ended = false;
        for event in events {
            match event {
                SseEvent::Done => stream_ended = true,
                SseEvent::Data(payload) => {
                    if let Some(text) = apply_event(map, &payload, &merge_params) {
                        latest_text = text;
                    }
                    dirty = true;
                    progress.update(map.len(), map.last_end_sec());
                }
            }
        }

        if dirty && last_snapshot_at.elapsed() >= params.checkpoint_save_interval {
            if let Err(e) = persist_snapshot(checkpoints, checkpoint_path, record, map, &latest_text) {
                break Err(e);
            }
            last_snapshot_at = Instant::now();
            dirty = false;
        }

        if stream_ended {
            break Ok(latest_text.clone());
        }
    };

    let _ = done_tx.send(());
    let _ = reporter.await;

    result
}

fn persist_snapshot(
    checkpoints: &CheckpointStore,
    checkpoint_path: &Path,
    record: &mut CheckpointRecord,
    map: &SegmentMap,
    latest_text: &str,
) -> Result<(), AttemptError> {
    record.segments = map.sorted();
    record.last_end_sec = map.last_end_sec();
    record.latest_text = latest_text.to_string();
    record.state = CheckpointState::InProgress;
    record.touch();
    checkpoints.save(checkpoint_path, record)?;
    Ok(())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
