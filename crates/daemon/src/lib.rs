// SPDX-License-Identifier: MIT

//! Process wiring for the transcription worker binary: startup sequencing,
//! log rotation, and the top-level poll loop. Kept as a library so the
//! pieces below `main` can be exercised directly in tests.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod lifecycle;
pub mod logging;

use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tw_adapters::{list_candidate_files, MediaHelper, TranscribeClient};
use tw_core::Config;
use tw_engine::{FileDriver, StopSignal};
use tw_storage::CheckpointStore;

/// Poll `config.input_dir` every `check_interval_sec` and hand each
/// candidate file to a fresh [`FileDriver`], one at a time, until `stop`
/// is raised.
pub async fn run_poll_loop(
    config: &Config,
    client: &TranscribeClient,
    media: &MediaHelper,
    checkpoints: &CheckpointStore,
    stop: &StopSignal,
) {
    let interval = Duration::from_secs(config.check_interval_sec.max(1));

    loop {
        if stop.is_set() {
            info!("stop signal observed, exiting poll loop");
            return;
        }

        for file in list_candidate_files(&config.input_dir, &config.supported_formats) {
            if stop.is_set() {
                info!("stop signal observed mid-scan, exiting poll loop");
                return;
            }
            process_one(config, client, media, checkpoints, stop, &file).await;
        }

        tw_engine::sleep_polling_stop(interval, stop).await;
    }
}

async fn process_one(
    config: &Config,
    client: &TranscribeClient,
    media: &MediaHelper,
    checkpoints: &CheckpointStore,
    stop: &StopSignal,
    file: &Path,
) {
    let driver = FileDriver::new(config, client, media, checkpoints, stop);
    let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    info!(file = %name, "starting transcription");
    if let Err(e) = driver.process(file).await {
        error!(file = %name, error = %e, "file processing ended in error");
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
