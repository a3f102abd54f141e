// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn update_then_snapshot_reflects_latest_values() {
    let shared = ProgressShared::new();
    shared.update(3, Some(12.5));
    let snap = shared.snapshot();
    assert_eq!(snap.segments_done, 3);
    assert_eq!(snap.last_end_sec, Some(12.5));
}

#[test]
fn line_includes_percent_when_duration_known() {
    let snapshot = ProgressSnapshot {
        segments_done: 2,
        last_end_sec: Some(30.0),
        last_event_at: Instant::now(),
    };
    let line = format_progress_line(&snapshot, Some(60.0), Duration::from_secs(10));
    assert!(line.contains("50.0%"));
}

#[test]
fn line_omits_percent_when_duration_unknown() {
    let snapshot = ProgressSnapshot {
        segments_done: 0,
        last_end_sec: None,
        last_event_at: Instant::now(),
    };
    let line = format_progress_line(&snapshot, None, Duration::from_secs(5));
    assert!(!line.contains('%'));
}

#[tokio::test(start_paused = true)]
async fn reporter_stops_when_done_signal_fires() {
    let shared = ProgressShared::new();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(run_progress_reporter(
        shared,
        Duration::from_secs(10),
        None,
        Instant::now(),
        rx,
    ));

    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
