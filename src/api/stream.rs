use crate::types::{EventRecord, StreamEvent};
use anyhow::Result;

/// Incremental SSE frame decoder. Chunks arrive with arbitrary boundaries; a
/// frame is only emitted once its `event:`/`data:` pair and the blank-line
/// terminator have fully arrived. The unconsumed tail stays buffered.
///
/// The buffer holds raw bytes. A chunk boundary can fall inside a multi-byte
/// UTF-8 codepoint, so text decoding happens per complete frame, never per
/// chunk.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = find_frame_terminator(&self.buffer[start..]) {
            let frame_end = start + end + 2;
            let frame_text = String::from_utf8_lossy(&self.buffer[start..frame_end]);

            let mut event_name = None;
            let mut data = None;

            for line in frame_text.lines() {
                if let Some(rest) = line.strip_prefix("event: ") {
                    event_name = Some(rest.to_string());
                } else if let Some(rest) = line.strip_prefix("data: ") {
                    data = Some(rest.trim().to_string());
                }
            }

            // Frames without both lines (stray blank lines, comments) are no-ops.
            if let (Some(event), Some(json_data)) = (event_name, data) {
                match serde_json::from_str::<serde_json::Value>(&json_data) {
                    Ok(value) => {
                        let record = EventRecord { event, data: value };
                        match StreamEvent::from_record(&record) {
                            Ok(parsed) => events.push(parsed),
                            Err(e) => {
                                eprintln!(
                                    "warning: skipping malformed {} payload: {e}",
                                    record.event
                                );
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("warning: skipping frame with invalid JSON: {e}");
                        eprintln!("  event: {event}");
                        eprintln!("  data: {json_data}");
                    }
                }
            }

            start = frame_end;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        Ok(events)
    }

    /// True when the transport closed mid-frame. The partial tail can never
    /// become a complete event, so it is reported and dropped, not emitted.
    pub fn has_partial_tail(&self) -> bool {
        !self.buffer.iter().all(u8::is_ascii_whitespace)
    }

    /// Discards the buffered tail at end-of-stream, returning it for logging.
    pub fn discard_tail(&mut self) -> String {
        let tail = std::mem::take(&mut self.buffer);
        String::from_utf8_lossy(&tail).into_owned()
    }
}

fn find_frame_terminator(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}
