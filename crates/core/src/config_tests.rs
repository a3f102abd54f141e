// SPDX-License-Identifier: MIT

use super::*;
use std::sync::Mutex;

// Config::from_env reads the whole process environment; serialize access so
// tests don't stomp on each other's vars when run concurrently.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ALL_VARS: &[&str] = &[
    "WHISPER_URL",
    "COMPLETE_AT_PERCENT",
    "REQUEST_TIMEOUT",
    "RETRY_DELAY_BASE",
    "SUPPORTED_FORMATS",
    "CHECKPOINT_DIR",
    "TEMP_DIR",
];

fn clear_vars() {
    for var in ALL_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn defaults_load_cleanly() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.whisper_url, "http://localhost:8000/v1/audio/transcriptions");
    assert_eq!(cfg.complete_at_percent, 0.98);
    assert!(cfg.supported_formats.contains(".wav"));
    clear_vars();
}

#[test]
fn empty_url_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    std::env::set_var("WHISPER_URL", "   ");
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Missing { var: "WHISPER_URL" }));
    clear_vars();
}

#[test]
fn out_of_range_complete_at_percent_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    std::env::set_var("COMPLETE_AT_PERCENT", "0");
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::CompleteAtPercentOutOfRange(_)));
    clear_vars();
}

#[test]
fn non_numeric_timeout_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    std::env::set_var("REQUEST_TIMEOUT", "soon");
    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "REQUEST_TIMEOUT", .. }));
    clear_vars();
}

#[test]
fn extensions_are_normalized() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    std::env::set_var("SUPPORTED_FORMATS", "WAV, .Mp3,flac");
    let cfg = Config::from_env().unwrap();
    assert!(cfg.supported_formats.contains(".wav"));
    assert!(cfg.supported_formats.contains(".mp3"));
    assert!(cfg.supported_formats.contains(".flac"));
    clear_vars();
}

#[test]
fn temp_dir_defaults_under_checkpoint_dir() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_vars();
    std::env::set_var("CHECKPOINT_DIR", "/data/checkpoints");
    let cfg = Config::from_env().unwrap();
    assert_eq!(cfg.temp_dir, PathBuf::from("/data/checkpoints/tmp"));
    clear_vars();
}
