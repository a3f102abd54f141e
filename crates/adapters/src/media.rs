// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// Errors surfaced by the external media toolkit.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{description} failed: {source}")]
    Spawn {
        description: &'static str,
        source: std::io::Error,
    },
    #[error("{description} timed out after {timeout:?}")]
    Timeout {
        description: &'static str,
        timeout: Duration,
    },
    #[error("{description} exited with status {status}: {stderr}")]
    NonZeroExit {
        description: &'static str,
        status: i32,
        stderr: String,
    },
}

const FFMPEG_TIMEOUT: Duration = Duration::from_secs(600);
const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps subprocess invocations of `ffmpeg`/`ffprobe` used for duration
/// probing, resume-chunk synthesis, and the optional VAD pre-pass.
#[derive(Debug, Clone, Default)]
pub struct MediaHelper;

impl MediaHelper {
    pub fn new() -> Self {
        Self
    }

    /// Probe a file's duration in seconds. Returns `None` on any failure —
    /// all downstream completion checks are conditional on a known
    /// duration.
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let mut cmd = Command::new("ffprobe");
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path);

        match run_with_timeout(cmd, FFPROBE_TIMEOUT, "ffprobe").await {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok()
            }
            Ok(_) | Err(_) => {
                warn!(path = %path.display(), "ffprobe failed to determine duration");
                None
            }
        }
    }

    /// Decimal megabytes of `path`, or `NaN` if the file cannot be stat'd.
    pub fn size_mb(&self, path: &Path) -> f64 {
        std::fs::metadata(path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(f64::NAN)
    }

    /// Cut the suffix of `src` starting at `offset_sec` into a small resume
    /// chunk. Tries a lossless audio stream copy first; on any failure,
    /// deletes the partial output and falls back to a 16 kHz mono FLAC
    /// re-encode.
    pub async fn cut_resume_chunk(
        &self,
        src: &Path,
        dst_base: &Path,
        offset_sec: f64,
    ) -> Result<PathBuf, MediaError> {
        if let Some(parent) = dst_base.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let dst_copy = dst_base.with_extension("mkv");
        let _ = std::fs::remove_file(&dst_copy);

        let mut copy_cmd = Command::new("ffmpeg");
        copy_cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-ss",
            &format!("{offset_sec:.3}"),
            "-i",
        ]);
        copy_cmd.arg(src);
        copy_cmd.args(["-vn", "-c:a", "copy"]).arg(&dst_copy);

        match run_with_timeout(copy_cmd, FFMPEG_TIMEOUT, "ffmpeg resume-cut (copy)").await {
            Ok(output) if output.status.success() => {
                info!(dst = %dst_copy.display(), mb = self.size_mb(&dst_copy), "resume chunk ready (copy)");
                return Ok(dst_copy);
            }
            other => {
                let _ = std::fs::remove_file(&dst_copy);
                warn!(error = ?other.err(), "copy-cut failed, falling back to FLAC re-encode");
            }
        }

        let dst_flac = dst_base.with_extension("flac");
        let _ = std::fs::remove_file(&dst_flac);

        let mut flac_cmd = Command::new("ffmpeg");
        flac_cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-ss",
            &format!("{offset_sec:.3}"),
            "-i",
        ]);
        flac_cmd.arg(src);
        flac_cmd
            .args(["-vn", "-ac", "1", "-ar", "16000", "-c:a", "flac"])
            .arg(&dst_flac);

        let output = run_with_timeout(flac_cmd, FFMPEG_TIMEOUT, "ffmpeg resume-cut (flac)").await?;
        require_success(&output, "ffmpeg resume-cut (flac)")?;
        info!(dst = %dst_flac.display(), mb = self.size_mb(&dst_flac), "resume chunk ready (flac)");
        Ok(dst_flac)
    }

    /// Mean volume of `path` in dB, via ffmpeg's `volumedetect` filter.
    /// Returns -91.0 (treated as silence) if detection fails.
    pub async fn mean_volume_db(&self, path: &Path) -> f64 {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner").arg("-i").arg(path).args([
            "-af",
            "volumedetect",
            "-vn",
            "-sn",
            "-dn",
            "-f",
            "null",
            "-",
        ]);

        let output = match run_with_timeout(cmd, FFMPEG_TIMEOUT, "ffmpeg volumedetect").await {
            Ok(o) => o,
            Err(_) => return -91.0,
        };

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        parse_mean_volume(&combined).unwrap_or(-91.0)
    }

    /// Silence-removal pre-pass. Writes a lossless FLAC intermediate with a
    /// dynamic threshold derived from the source's mean volume. Returns
    /// `false` (leaving `dst` unwritten) when the source is judged already
    /// near-silent.
    pub async fn remove_silence(&self, src: &Path, dst: &Path) -> Result<bool, MediaError> {
        let mean_db = self.mean_volume_db(src).await;
        if mean_db < -70.0 {
            info!(mean_db, "audio already near-silent, skipping VAD pre-pass");
            return Ok(false);
        }

        let threshold_db = (mean_db - 20.0).clamp(-60.0, -20.0);

        if let Some(parent) = dst.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::remove_file(dst);

        let filter = format!("silenceremove=stop_periods=-1:stop_duration=0.5:stop_threshold={threshold_db:.1}dB");

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-i"]);
        cmd.arg(src);
        cmd.args(["-af", &filter, "-c:a", "flac"]).arg(dst);

        let output = run_with_timeout(cmd, FFMPEG_TIMEOUT, "ffmpeg silenceremove").await?;
        require_success(&output, "ffmpeg silenceremove")?;
        info!(mean_db, threshold_db, dst = %dst.display(), "silence removed");
        Ok(true)
    }
}

/// Wraps `Command::output()` with a timeout, converting elapsed time into a
/// descriptive error.
async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &'static str,
) -> Result<Output, MediaError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(MediaError::Spawn { description, source }),
        Err(_) => Err(MediaError::Timeout { description, timeout }),
    }
}

/// Parse the `mean_volume: -25.4 dB` line out of ffmpeg's `volumedetect`
/// output, wherever it appears among the other log lines.
fn parse_mean_volume(text: &str) -> Option<f64> {
    for line in text.lines() {
        if let Some(idx) = line.find("mean_volume:") {
            let rest = &line[idx + "mean_volume:".len()..];
            if let Some(value) = rest.trim().split(' ').next() {
                if let Ok(db) = value.parse::<f64>() {
                    return Some(db);
                }
            }
        }
    }
    None
}

fn require_success(output: &Output, description: &'static str) -> Result<(), MediaError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(MediaError::NonZeroExit {
            description,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
