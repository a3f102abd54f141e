// SPDX-License-Identifier: MIT

use chrono::Utc;

/// Current UTC time as an ISO-8601 string with second precision.
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Format a duration in seconds as `HH:MM:SS`, matching the progress line
/// format used throughout the worker's logs.
pub fn fmt_hhmmss(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0).round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
