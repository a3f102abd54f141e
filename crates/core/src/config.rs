// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent [`Config::from_env`] from producing a usable config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be set to a non-empty value")]
    Missing { var: &'static str },
    #[error("{var}={value:?} is not a valid {kind}")]
    Invalid {
        var: &'static str,
        value: String,
        kind: &'static str,
    },
    #[error("{var} must be > 0, got {value}")]
    NotPositive { var: &'static str, value: f64 },
    #[error("COMPLETE_AT_PERCENT must be in (0, 1], got {0}")]
    CompleteAtPercentOutOfRange(f64),
}

/// Every tunable the worker reads from the environment, validated once at
/// startup and immutable afterward.
#[derive(Debug, Clone)]
pub struct Config {
    pub whisper_url: String,
    pub whisper_model: String,
    pub whisper_language: Option<String>,
    pub whisper_response_format: String,
    pub whisper_stream: bool,

    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub temp_dir: PathBuf,

    pub supported_formats: BTreeSet<String>,

    pub check_interval_sec: u64,
    pub max_retries: u32,
    pub retry_delay_base_sec: f64,
    pub request_timeout_sec: u64,
    pub connect_timeout_sec: u64,
    pub server_wait_timeout_sec: u64,
    pub progress_log_every_sec: u64,
    pub checkpoint_save_interval_sec: u64,

    pub resume_enabled: bool,
    pub resume_overlap_sec: f64,
    pub resume_min_last_end_sec: f64,

    pub rename_failed: bool,
    pub complete_at_percent: f64,

    pub vad_enabled: bool,
    pub log_level: String,
}

impl Config {
    /// Load and validate configuration from the process environment.
    ///
    /// Never panics. Every documented default matches §10 of the worker's
    /// design notes; `TEMP_DIR` defaults relative to `checkpoint_dir` when
    /// unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let whisper_url = env_string(
            "WHISPER_URL",
            "http://localhost:8000/v1/audio/transcriptions",
        );
        if whisper_url.trim().is_empty() {
            return Err(ConfigError::Missing { var: "WHISPER_URL" });
        }

        let checkpoint_dir = PathBuf::from(env_string("CHECKPOINT_DIR", "/data/checkpoints"));
        let temp_dir = std::env::var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| checkpoint_dir.join("tmp"));

        let complete_at_percent = env_f64("COMPLETE_AT_PERCENT", 0.98)?;
        if !(complete_at_percent > 0.0 && complete_at_percent <= 1.0) {
            return Err(ConfigError::CompleteAtPercentOutOfRange(complete_at_percent));
        }

        let request_timeout_sec = env_u64("REQUEST_TIMEOUT", 1800)?;
        let connect_timeout_sec = env_u64("CONNECT_TIMEOUT", 10)?;
        let server_wait_timeout_sec = env_u64("SERVER_WAIT_TIMEOUT", 180)?;
        for (var, value) in [
            ("REQUEST_TIMEOUT", request_timeout_sec),
            ("CONNECT_TIMEOUT", connect_timeout_sec),
            ("SERVER_WAIT_TIMEOUT", server_wait_timeout_sec),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive {
                    var,
                    value: value as f64,
                });
            }
        }

        let retry_delay_base_sec = env_f64("RETRY_DELAY_BASE", 30.0)?;
        if retry_delay_base_sec <= 0.0 {
            return Err(ConfigError::NotPositive {
                var: "RETRY_DELAY_BASE",
                value: retry_delay_base_sec,
            });
        }

        let language = env_string("WHISPER_LANGUAGE", "");
        let whisper_language = if language.trim().is_empty() {
            None
        } else {
            Some(language)
        };

        let supported_formats = env_string(
            "SUPPORTED_FORMATS",
            ".mp3,.wav,.m4a,.mp4,.mkv,.flac,.ogg,.webm",
        )
        .split(',')
        .map(|raw| normalize_extension(raw.trim()))
        .filter(|ext| !ext.is_empty())
        .collect();

        Ok(Self {
            whisper_url,
            whisper_model: env_string("WHISPER_MODEL", "base"),
            whisper_language,
            whisper_response_format: env_string("WHISPER_RESPONSE_FORMAT", "verbose_json"),
            whisper_stream: env_bool("WHISPER_STREAM", true),

            input_dir: PathBuf::from(env_string("INPUT_DIR", "/data/input")),
            output_dir: PathBuf::from(env_string("OUTPUT_DIR", "/data/output")),
            log_dir: PathBuf::from(env_string("LOG_DIR", "/data/logs")),
            checkpoint_dir,
            temp_dir,

            supported_formats,

            check_interval_sec: env_u64("CHECK_INTERVAL", 10)?,
            max_retries: env_u64("MAX_RETRIES", 3)? as u32,
            retry_delay_base_sec,
            request_timeout_sec,
            connect_timeout_sec,
            server_wait_timeout_sec,
            progress_log_every_sec: env_u64("PROGRESS_LOG_EVERY", 10)?,
            checkpoint_save_interval_sec: env_u64("CHECKPOINT_SAVE_INTERVAL", 10)?,

            resume_enabled: env_bool("RESUME_ENABLED", true),
            resume_overlap_sec: env_f64("RESUME_OVERLAP_SEC", 2.0)?,
            resume_min_last_end_sec: env_f64("RESUME_MIN_LAST_END_SEC", 5.0)?,

            rename_failed: env_bool("RENAME_FAILED", true),
            complete_at_percent,

            vad_enabled: env_bool("VAD_ENABLED", false),
            log_level: env_string("LOG_LEVEL", "info"),
        })
    }
}

fn env_string(var: &'static str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_bool(var: &'static str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
            var,
            value: v,
            kind: "non-negative integer",
        }),
        Err(_) => Ok(default),
    }
}

fn env_f64(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(var) {
        Ok(v) => v.trim().parse::<f64>().map_err(|_| ConfigError::Invalid {
            var,
            value: v,
            kind: "number",
        }),
        Err(_) => Ok(default),
    }
}

fn normalize_extension(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let lower = raw.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
