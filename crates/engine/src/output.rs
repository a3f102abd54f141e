// SPDX-License-Identifier: MIT

use std::path::Path;
use std::time::Duration;
use tw_core::Segment;
use tw_storage::{write_text, FsAtomicWriter, StorageError};

/// Context stamped into the timestamped output's header block.
pub struct OutputMeta<'a> {
    pub file_name: &'a str,
    pub duration_sec: Option<f64>,
    pub model: &'a str,
    pub language: Option<&'a str>,
    pub elapsed: Duration,
}

/// Write `<stem>.txt` and `<stem>_timestamped.txt` under `output_dir`, both
/// via the atomic text writer so a crash mid-write never leaves a truncated
/// transcript in place of a prior successful one.
pub fn write_outputs(
    output_dir: &Path,
    stem: &str,
    transcript: &str,
    segments: &[Segment],
    meta: &OutputMeta<'_>,
) -> Result<(), StorageError> {
    let writer = FsAtomicWriter;

    let plain_path = output_dir.join(format!("{stem}.txt"));
    let mut plain = transcript.trim().to_string();
    plain.push('\n');
    write_text(&writer, &plain_path, &plain)?;

    let timestamped_path = output_dir.join(format!("{stem}_timestamped.txt"));
    write_text(
        &writer,
        &timestamped_path,
        &render_timestamped(transcript, segments, meta),
    )?;
    Ok(())
}

fn render_timestamped(transcript: &str, segments: &[Segment], meta: &OutputMeta<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("file: {}\n", meta.file_name));
    out.push_str(&format!(
        "duration_sec: {}\n",
        meta.duration_sec
            .map(|d| format!("{d:.3}"))
            .unwrap_or_else(|| "unknown".to_string())
    ));
    out.push_str(&format!("model: {}\n", meta.model));
    if let Some(language) = meta.language {
        out.push_str(&format!("language: {language}\n"));
    }
    out.push_str(&format!("elapsed_sec: {:.3}\n", meta.elapsed.as_secs_f64()));
    out.push_str(&format!("segments: {}\n", segments.len()));
    out.push('\n');
    out.push_str("transcript:\n");
    out.push_str(transcript.trim());
    out.push_str("\n\n");
    out.push_str("segments_timestamped:\n");
    for seg in segments {
        out.push_str(&format!(
            "[{:09.3} - {:09.3}] {}\n",
            seg.start,
            seg.end,
            seg.text.trim()
        ));
    }
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
