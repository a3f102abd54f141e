// SPDX-License-Identifier: MIT

use crate::error::{AttemptError, DriverError};
use crate::merger::SegmentMap;
use crate::output::{write_outputs, OutputMeta};
use crate::session::{run_session, SessionParams};
use crate::stop::{sleep_polling_stop, StopSignal};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tw_adapters::{MediaHelper, TranscribeClient};
use tw_core::{CheckpointRecord, CheckpointState, Config, FileSignature};
use tw_storage::CheckpointStore;

/// Drives one input file from discovery through a terminal outcome: loads or
/// initializes its checkpoint, runs the VAD pre-pass and duration probe once,
/// then loops transcription attempts until success, permanent failure, or a
/// cooperative shutdown.
pub struct FileDriver<'a> {
    config: &'a Config,
    client: &'a TranscribeClient,
    media: &'a MediaHelper,
    checkpoints: &'a CheckpointStore,
    stop: &'a StopSignal,
}

impl<'a> FileDriver<'a> {
    pub fn new(
        config: &'a Config,
        client: &'a TranscribeClient,
        media: &'a MediaHelper,
        checkpoints: &'a CheckpointStore,
        stop: &'a StopSignal,
    ) -> Self {
        Self {
            config,
            client,
            media,
            checkpoints,
            stop,
        }
    }

    pub async fn process(&self, input_path: &Path) -> Result<(), DriverError> {
        let file_name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input_path.to_string_lossy().to_string());
        let checkpoint_path = self.checkpoints.path_for(&file_name);

        let mut record = self.load_or_init(&file_name, input_path, &checkpoint_path)?;

        let mut working_copy = input_path.to_path_buf();
        if self.config.vad_enabled {
            working_copy = self.run_vad_prepass(input_path, &file_name).await;
        }

        let duration = self.media.probe_duration(&working_copy).await;
        let mut map = SegmentMap::from_segments(record.segments.clone());
        let started_at = Instant::now();

        while record.attempts < self.config.max_retries {
            if self.stop.is_set() {
                return Ok(());
            }

            record.attempts += 1;
            record.state = CheckpointState::InProgress;
            record.touch();
            self.checkpoints.save(&checkpoint_path, &record)?;

            let plan = self
                .plan_attempt(input_path, &working_copy, &file_name, duration, &record)
                .await;
            let (upload_path, resume_offset_sec, drop_ends_leq_sec, resume_chunk) = match plan {
                Ok(plan) => plan,
                Err(media_err) => {
                    self.record_failure(&checkpoint_path, &mut record, &map, &media_err.to_string())?;
                    self.backoff(record.attempts).await;
                    continue;
                }
            };

            let params = SessionParams {
                model: &self.config.whisper_model,
                response_format: &self.config.whisper_response_format,
                stream: self.config.whisper_stream,
                language: self.config.whisper_language.as_deref(),
                upload_path: &upload_path,
                resume_offset_sec,
                drop_ends_leq_sec,
                checkpoint_save_interval: Duration::from_secs(self.config.checkpoint_save_interval_sec),
                progress_log_every: Duration::from_secs(self.config.progress_log_every_sec),
                duration_hint: duration,
            };

            let outcome = run_session(
                self.client,
                self.checkpoints,
                &checkpoint_path,
                &mut record,
                &mut map,
                &params,
                self.stop,
            )
            .await;

            if let Some(chunk) = &resume_chunk {
                let _ = std::fs::remove_file(chunk);
            }

            match outcome {
                Ok(latest_text) => {
                    match self.validate_completion(duration, &map, &latest_text) {
                        Ok(transcript) => {
                            self.finalize_success(
                                input_path,
                                &checkpoint_path,
                                &mut record,
                                &map,
                                transcript,
                                duration,
                                started_at.elapsed(),
                            )?;
                            return Ok(());
                        }
                        Err(reason) => {
                            self.record_failure(&checkpoint_path, &mut record, &map, &reason)?;
                            self.backoff(record.attempts).await;
                        }
                    }
                }
                Err(AttemptError::ShutdownRequested) => {
                    self.record_interrupted(&checkpoint_path, &mut record, &map)?;
                    return Ok(());
                }
                Err(e) => {
                    self.record_failure(&checkpoint_path, &mut record, &map, &e.to_string())?;
                    self.backoff(record.attempts).await;
                }
            }
        }

        self.finalize_permanent_failure(input_path, &checkpoint_path, &mut record)?;
        Ok(())
    }

    fn load_or_init(
        &self,
        file_name: &str,
        input_path: &Path,
        checkpoint_path: &Path,
    ) -> Result<CheckpointRecord, DriverError> {
        let signature = FileSignature::of(input_path)?;
        let existing = self.checkpoints.load(checkpoint_path);
        let record = match existing {
            Some(record) if record.file_signature == signature => record,
            Some(_) => {
                info!(file = file_name, "checkpoint signature mismatch, starting fresh");
                CheckpointRecord::fresh(file_name, &input_path.to_string_lossy(), signature)
            }
            None => CheckpointRecord::fresh(file_name, &input_path.to_string_lossy(), signature),
        };
        self.checkpoints.save(checkpoint_path, &record)?;
        Ok(record)
    }

    async fn run_vad_prepass(&self, input_path: &Path, file_name: &str) -> PathBuf {
        let dst = self.config.temp_dir.join(format!("vad_{file_name}.flac"));
        match self.media.remove_silence(input_path, &dst).await {
            Ok(true) => dst,
            Ok(false) => input_path.to_path_buf(),
            Err(e) => {
                warn!(error = %e, "VAD pre-pass failed, continuing with the original input");
                input_path.to_path_buf()
            }
        }
    }

    /// Decide whether this attempt resumes from `last_end_sec`, and if so,
    /// cut a fresh chunk from the *original* input at the computed offset.
    async fn plan_attempt(
        &self,
        original_input: &Path,
        working_copy: &Path,
        file_name: &str,
        duration: Option<f64>,
        record: &CheckpointRecord,
    ) -> Result<(PathBuf, f64, Option<f64>, Option<PathBuf>), tw_adapters::MediaError> {
        let should_resume = self.config.resume_enabled
            && matches!(duration, Some(d) if d > 0.0)
            && matches!(record.last_end_sec, Some(last_end)
                if last_end >= self.config.resume_min_last_end_sec
                    && last_end < duration.unwrap_or(0.0) - 1.0);

        if !should_resume {
            return Ok((working_copy.to_path_buf(), 0.0, None, None));
        }

        let last_end = record.last_end_sec.unwrap_or(0.0);
        let offset = (last_end - self.config.resume_overlap_sec).max(0.0);
        let chunk_base = self.config.temp_dir.join(format!("resume_{file_name}"));
        let _ = std::fs::remove_file(chunk_base.with_extension("mkv"));
        let _ = std::fs::remove_file(chunk_base.with_extension("flac"));

        let chunk = self
            .media
            .cut_resume_chunk(original_input, &chunk_base, offset)
            .await?;
        Ok((chunk.clone(), offset, Some(last_end), Some(chunk)))
    }

    /// Returns the final transcript on success, or the failure reason on a
    /// completion-threshold or empty-output miss.
    fn validate_completion(
        &self,
        duration: Option<f64>,
        map: &SegmentMap,
        latest_text: &str,
    ) -> Result<String, String> {
        if let (Some(d), false) = (duration, map.is_empty()) {
            if d > 0.0 {
                let pct = map.last_end_sec().unwrap_or(0.0) / d;
                if pct < self.config.complete_at_percent {
                    return Err(format!(
                        "incomplete: covered {:.1}% of {:.1}s (need {:.1}%)",
                        pct * 100.0,
                        d,
                        self.config.complete_at_percent * 100.0
                    ));
                }
            }
        } else if let (Some(d), true) = (duration, map.is_empty()) {
            if d > 0.0 {
                return Err("incomplete: zero segments transcribed".to_string());
            }
        }

        let transcript = if map.is_empty() {
            latest_text.to_string()
        } else {
            map.transcript()
        };
        if transcript.trim().is_empty() {
            return Err("empty transcript".to_string());
        }
        Ok(transcript)
    }

    fn record_failure(
        &self,
        checkpoint_path: &Path,
        record: &mut CheckpointRecord,
        map: &SegmentMap,
        error: &str,
    ) -> Result<(), DriverError> {
        record.segments = map.sorted();
        record.last_end_sec = map.last_end_sec();
        record.state = CheckpointState::FailedAttempt;
        record.last_error = Some(error.to_string());
        record.touch();
        self.checkpoints.save(checkpoint_path, record)?;
        warn!(file = %record.file_name, attempt = record.attempts, error, "transcription attempt failed");
        Ok(())
    }

    fn record_interrupted(
        &self,
        checkpoint_path: &Path,
        record: &mut CheckpointRecord,
        map: &SegmentMap,
    ) -> Result<(), DriverError> {
        record.segments = map.sorted();
        record.last_end_sec = map.last_end_sec();
        record.state = CheckpointState::Interrupted;
        record.attempts = record.attempts.saturating_sub(1);
        record.touch();
        self.checkpoints.save(checkpoint_path, record)?;
        info!(file = %record.file_name, "shutdown requested mid-attempt, progress retained");
        Ok(())
    }

    async fn backoff(&self, attempt: u32) {
        let delay_sec = self.config.retry_delay_base_sec * 2f64.powi(attempt.saturating_sub(1) as i32);
        sleep_polling_stop(Duration::from_secs_f64(delay_sec), self.stop).await;
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize_success(
        &self,
        input_path: &Path,
        checkpoint_path: &Path,
        record: &mut CheckpointRecord,
        map: &SegmentMap,
        transcript: String,
        duration: Option<f64>,
        elapsed: Duration,
    ) -> Result<(), DriverError> {
        let stem = Path::new(&record.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| record.file_name.clone());
        let segments = map.sorted();
        let meta = OutputMeta {
            file_name: &record.file_name,
            duration_sec: duration,
            model: &self.config.whisper_model,
            language: self.config.whisper_language.as_deref(),
            elapsed,
        };
        write_outputs(&self.config.output_dir, &stem, &transcript, &segments, &meta)?;

        if let Err(e) = rename_marked(input_path, "processed_") {
            warn!(file = %record.file_name, error = %e, "could not rename processed source file");
        }

        let _ = tw_storage::soft_delete(checkpoint_path);
        info!(file = %record.file_name, segments = segments.len(), "transcription complete");
        Ok(())
    }

    fn finalize_permanent_failure(
        &self,
        input_path: &Path,
        checkpoint_path: &Path,
        record: &mut CheckpointRecord,
    ) -> Result<(), DriverError> {
        record.state = CheckpointState::PermanentFailed;
        record.touch();
        self.checkpoints.save(checkpoint_path, record)?;

        if self.config.rename_failed && input_path.exists() {
            match rename_marked(input_path, "failed_") {
                Ok(renamed) => {
                    record.file_path = renamed.to_string_lossy().to_string();
                    record.touch();
                    self.checkpoints.save(checkpoint_path, record)?;
                }
                Err(e) => warn!(file = %record.file_name, error = %e, "could not rename permanently failed source file"),
            }
        }
        warn!(file = %record.file_name, attempts = record.attempts, "permanently failed");
        Ok(())
    }
}

/// Rename `path` to `<prefix><name>`, or `<prefix><timestamp>_<name>` if that
/// name is already taken.
fn rename_marked(path: &Path, prefix: &str) -> std::io::Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut dest = parent.join(format!("{prefix}{name}"));
    if dest.exists() {
        let stamp = tw_core::utc_now_iso().replace([':', '-'], "");
        dest = parent.join(format!("{prefix}{stamp}_{name}"));
    }
    std::fs::rename(path, &dest)?;
    Ok(dest)
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
