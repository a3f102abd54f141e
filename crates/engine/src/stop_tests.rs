// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test(start_paused = true)]
async fn sleep_returns_early_when_stop_already_set() {
    let stop = StopSignal::new();
    stop.set();
    let start = tokio::time::Instant::now();
    sleep_polling_stop(Duration::from_secs(30), &stop).await;
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn sleep_runs_full_duration_when_never_stopped() {
    let stop = StopSignal::new();
    let start = tokio::time::Instant::now();
    sleep_polling_stop(Duration::from_secs(3), &stop).await;
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[test]
fn clone_shares_the_same_flag() {
    let a = StopSignal::new();
    let b = a.clone();
    b.set();
    assert!(a.is_set());
}
