// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A single process-wide cooperative cancellation flag, set by SIGINT/SIGTERM
/// and polled between SSE events and once per second during backoff sleeps.
/// Never used to abort a blocking I/O call directly.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sleep for `total`, checking `stop` once per second so a pending shutdown
/// cuts a long backoff delay short.
pub async fn sleep_polling_stop(total: Duration, stop: &StopSignal) {
    let step = Duration::from_secs(1);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if stop.is_set() {
            return;
        }
        let this_sleep = remaining.min(step);
        tokio::time::sleep(this_sleep).await;
        remaining = remaining.saturating_sub(this_sleep);
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
