// SPDX-License-Identifier: MIT

use crate::{SseEvent, SseReader};
use reqwest::multipart;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from the transcription HTTP client.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("could not read upload file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned non-2xx status {0}")]
    HttpStatus(u16),
}

/// Parameters for a single POST+SSE transcription attempt.
pub struct TranscribeRequest<'a> {
    pub model: &'a str,
    pub response_format: &'a str,
    pub stream: bool,
    pub language: Option<&'a str>,
    pub file_path: &'a Path,
}

/// Streaming multipart POST client for the transcription endpoint.
pub struct TranscribeClient {
    http: reqwest::Client,
    url: String,
}

impl TranscribeClient {
    pub fn new(
        url: String,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TranscribeError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { http, url })
    }

    /// Issue the multipart POST and return a handle for consuming the SSE
    /// response body one chunk at a time. A non-2xx response fails the
    /// attempt before any body is read.
    pub async fn start(&self, req: &TranscribeRequest<'_>) -> Result<TranscribeStream, TranscribeError> {
        let bytes = tokio::fs::read(req.file_path).await?;
        let file_name = req
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        let mime = guess_mime(&file_name);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)?;

        let mut form = multipart::Form::new()
            .text("model", req.model.to_string())
            .text("response_format", req.response_format.to_string())
            .text("stream", if req.stream { "true" } else { "false" })
            .part("file", part);
        if let Some(language) = req.language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscribeError::HttpStatus(status.as_u16()));
        }

        Ok(TranscribeStream {
            response: Some(response),
            reader: SseReader::new(),
        })
    }
}

/// A live SSE response body, consumed one network chunk at a time so the
/// caller can interleave a stop-signal check between reads.
#[derive(Debug)]
pub struct TranscribeStream {
    response: Option<reqwest::Response>,
    reader: SseReader,
}

impl TranscribeStream {
    /// Await the next chunk of bytes and return any events it completed.
    /// Returns `Ok(None)` once the body and any trailing buffered data have
    /// both been fully drained.
    pub async fn next_events(&mut self) -> Result<Option<Vec<SseEvent>>, TranscribeError> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };

        match response.chunk().await? {
            Some(bytes) => Ok(Some(self.reader.feed(&bytes))),
            None => {
                self.response = None;
                let reader = std::mem::take(&mut self.reader);
                Ok(reader.finish().map(|event| vec![event]))
            }
        }
    }
}

/// Guess a MIME type from a file's extension, matching the small set of
/// formats this worker accepts.
fn guess_mime(file_name: &str) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or("").to_lowercase();
    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

#[cfg(test)]
#[path = "transcribe_tests.rs"]
mod tests;
