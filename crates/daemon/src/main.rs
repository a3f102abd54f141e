// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tw_adapters::{MediaHelper, TranscribeClient};
use tw_core::Config;
use tw_daemon::lifecycle;
use tw_daemon::logging::{rotate_log_if_needed, setup_logging};
use tw_daemon::run_poll_loop;
use tw_engine::StopSignal;
use tw_storage::CheckpointStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("twd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("twd {}", env!("CARGO_PKG_VERSION"));
                println!("Transcription worker — watches INPUT_DIR and transcribes new audio files.");
                println!();
                println!("USAGE:");
                println!("    twd");
                println!();
                println!("All configuration is read from the environment; see the README for");
                println!("the list of variables.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("usage: twd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::from_env()?;

    rotate_log_if_needed(&config.log_dir);
    let _log_guard = setup_logging(&config.log_dir, &config.log_level)?;

    info!("starting transcription worker");

    if let Err(e) = lifecycle::create_directories(&config) {
        error!(error = %e, "failed to create configured directories");
        return Err(e.into());
    }

    if let Err(e) =
        lifecycle::wait_for_server_ready(&config.whisper_url, Duration::from_secs(config.server_wait_timeout_sec)).await
    {
        error!(error = %e, "transcription endpoint never became reachable");
        return Err(e.into());
    }

    let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());
    match lifecycle::cleanup_orphan_checkpoints(&checkpoints) {
        Ok(0) => {}
        Ok(n) => info!(count = n, "soft-deleted orphan checkpoints from a previous run"),
        Err(e) => error!(error = %e, "failed to scan checkpoint directory for orphans"),
    }
    if let Err(e) = lifecycle::wipe_temp_dir(&config.temp_dir) {
        error!(error = %e, "failed to clear the temp directory");
    }

    let client = TranscribeClient::new(
        config.whisper_url.clone(),
        Duration::from_secs(config.connect_timeout_sec),
        Duration::from_secs(config.request_timeout_sec),
    )?;
    let media = MediaHelper::new();
    let stop = StopSignal::new();

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        signal_stop.set();
    });

    info!(
        input_dir = %config.input_dir.display(),
        check_interval_sec = config.check_interval_sec,
        "worker ready"
    );
    println!("READY");

    run_poll_loop(&config, &client, &media, &checkpoints, &stop).await;

    info!("transcription worker shut down cleanly");
    Ok(())
}
