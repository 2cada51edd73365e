//! Incremental decoder for the event-delimited response body.
//!
//! Bytes arrive in arbitrary chunks. [`Utf8CarryBuffer`] turns them into
//! characters without losing a code point split across two chunks, and
//! [`StreamDecoder`] cuts the resulting text into frames on
//! [`FRAME_DELIMITER`], emitting one [`StreamEvent`] per payload line.

use std::fmt;

use memchr::memmem;
use tracing::debug;

use crate::core::constants::{DATA_MARKER, DONE_SENTINEL, FRAME_DELIMITER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    Done,
    /// The byte source failed; no further events follow.
    Failed(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed(_))
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            StreamEvent::Token(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Returned by [`StreamDecoder::ingest`] once the stream has terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderClosed;

impl fmt::Display for DecoderClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream decoder already terminated; reset before reuse")
    }
}

impl std::error::Error for DecoderClosed {}

/// Holds the tail of a chunk that ends in the middle of a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct Utf8CarryBuffer {
    pending: Vec<u8>,
}

impl Utf8CarryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every complete character decoded so far.
    ///
    /// An incomplete trailing sequence stays buffered for the next call.
    /// Invalid sequences are replaced with U+FFFD.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut decoded = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    decoded.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending[start..valid_end]) {
                        decoded.push_str(valid);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            decoded.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        decoded
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Strips the payload marker and at most one separating space.
///
/// Returns `None` for lines that carry no payload marker.
pub fn extract_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(DATA_MARKER)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    carry: Utf8CarryBuffer,
    buffer: String,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk of the response body.
    ///
    /// Emits events only for complete frames; partial frames are retained
    /// until a later chunk completes them. After [`StreamEvent::Done`] or a
    /// failure the decoder refuses further input until [`reset`](Self::reset).
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>, DecoderClosed> {
        if self.finished {
            return Err(DecoderClosed);
        }

        let text = self.carry.push(chunk);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        let finder = memmem::Finder::new(FRAME_DELIMITER);
        let mut consumed = 0;

        while let Some(offset) = finder.find(&self.buffer.as_bytes()[consumed..]) {
            let frame_end = consumed + offset;
            let frame = &self.buffer[consumed..frame_end];
            consumed = frame_end + FRAME_DELIMITER.len();

            if Self::decode_frame(frame, &mut events) {
                self.finished = true;
                break;
            }
        }

        if self.finished {
            if consumed < self.buffer.len() {
                debug!(
                    discarded = self.buffer.len() - consumed,
                    "discarding data after stream sentinel"
                );
            }
            self.buffer.clear();
            self.carry.reset();
        } else {
            self.buffer.drain(..consumed);
        }

        Ok(events)
    }

    /// Records a byte-source failure and closes the decoder.
    pub fn fail(&mut self, error: impl fmt::Display) -> StreamEvent {
        self.finished = true;
        self.buffer.clear();
        self.carry.reset();
        StreamEvent::Failed(error.to_string())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether bytes are buffered that have not yet formed a complete frame.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.carry.has_pending()
    }

    pub fn reset(&mut self) {
        self.carry.reset();
        self.buffer.clear();
        self.finished = false;
    }

    /// Appends the events of one frame; returns `true` when the sentinel was seen.
    fn decode_frame(frame: &str, events: &mut Vec<StreamEvent>) -> bool {
        for line in frame.split('\n') {
            let Some(payload) = extract_payload(line) else {
                continue;
            };

            if payload == DONE_SENTINEL {
                events.push(StreamEvent::Done);
                return true;
            }

            if payload.is_empty() {
                events.push(StreamEvent::Token("\n".to_string()));
            } else {
                events.push(StreamEvent::Token(payload.to_string()));
            }
        }
        false
    }
}
