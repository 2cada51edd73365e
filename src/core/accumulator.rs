//! Folds decoder events into a [`Transcript`].
//!
//! Every function takes the transcript by value and hands it back, so
//! replaying the same events against the same starting transcript always
//! produces the same result.

use crate::core::message::{ChatMessage, Transcript};
use crate::core::stream_decoder::StreamEvent;

/// Extends the trailing assistant turn with `text`, or starts one when the
/// transcript is empty or ends with a user turn.
pub fn apply_token(mut transcript: Transcript, text: &str) -> Transcript {
    match transcript.last_mut() {
        Some(last) if last.is_assistant() => last.content.push_str(text),
        _ => transcript.push(ChatMessage::assistant(text)),
    }
    transcript
}

/// Appends a user turn verbatim. User turns are never merged.
pub fn apply_user_turn(mut transcript: Transcript, text: impl Into<String>) -> Transcript {
    transcript.push(ChatMessage::user(text));
    transcript
}

pub fn apply_event(transcript: Transcript, event: &StreamEvent) -> Transcript {
    match event {
        StreamEvent::Token(text) => apply_token(transcript, text),
        StreamEvent::Done | StreamEvent::Failed(_) => transcript,
    }
}
