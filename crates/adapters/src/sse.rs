// SPDX-License-Identifier: MIT

/// One framed server-sent event, after `data:` prefix stripping and
/// blank-line buffering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload, possibly joined from several consecutive lines.
    Data(String),
    /// The stream's `[DONE]`/`DONE` termination sentinel.
    Done,
}

/// Line-buffering SSE framer.
///
/// Unlike a per-line emitter, this buffers every consecutive `data:` line
/// until a blank line (or end of stream) flushes them as one payload joined
/// with `\n`, matching the framing the transcription server actually uses:
/// multi-line JSON bodies spread across several `data:` lines within a
/// single event.
#[derive(Debug, Default)]
pub struct SseReader {
    carry: String,
    data_lines: Vec<String>,
}

impl SseReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes from the response body, returning any events
    /// completed by lines within this chunk. Incomplete trailing bytes are
    /// buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.carry.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        while let Some(pos) = self.carry.find('\n') {
            let raw_line = self.carry[..pos].to_string();
            self.carry.drain(..=pos);
            let line = raw_line.strip_suffix('\r').unwrap_or(&raw_line);
            self.process_line(line, &mut events);
        }
        events
    }

    /// Flush any buffered `data:` lines once the stream has ended, even if
    /// no trailing blank line arrived.
    pub fn finish(mut self) -> Option<SseEvent> {
        self.flush_pending()
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            if let Some(event) = self.flush_pending() {
                events.push(event);
            }
        } else if let Some(data) = strip_data_prefix(line) {
            self.data_lines.push(data.to_string());
        }
        // event:, id:, retry:, and comment lines carry no meaning here.
    }

    fn flush_pending(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            return None;
        }
        let payload = self.data_lines.join("\n");
        self.data_lines.clear();
        if payload == "[DONE]" || payload == "DONE" {
            Some(SseEvent::Done)
        } else {
            Some(SseEvent::Data(payload))
        }
    }
}

/// Strip the `data:` prefix from a line, then strip a single leading space
/// if present — not all leading whitespace, and not assuming the space is
/// always there.
fn strip_data_prefix(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
