//! Session controller.
//!
//! Owns the transcript, the loading flag and the handle of the open stream.
//! All mutation goes through here so that every change is persisted and no
//! stale reader task can write into a transcript that has been reset.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::accumulator::{apply_token, apply_user_turn};
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::message::Transcript;
use crate::core::store::{load_or_empty, TranscriptStore};

pub struct Session {
    transcript: Transcript,
    loading: bool,
    last_error: Option<String>,
    store: Box<dyn TranscriptStore>,
    client: reqwest::Client,
    endpoint: String,
    stream_cancel_token: Option<CancellationToken>,
    current_stream_id: u64,
}

impl Session {
    /// Loads the stored transcript once, before anything can be written back.
    pub fn initialize(store: Box<dyn TranscriptStore>, endpoint: impl Into<String>) -> Self {
        let transcript = load_or_empty(store.as_ref());
        debug!(messages = transcript.len(), "session initialized from store");
        Self {
            transcript,
            loading: false,
            last_error: None,
            store,
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            stream_cancel_token: None,
            current_stream_id: 0,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.stream_cancel_token.is_some() && self.current_stream_id == stream_id
    }

    /// Appends a user turn and prepares the request that answers it.
    ///
    /// Blank input is ignored. Any stream still open is cancelled first, so
    /// replies from two requests never interleave.
    pub fn submit(&mut self, text: &str) -> Option<StreamParams> {
        if text.trim().is_empty() {
            return None;
        }

        self.cancel_current_stream();
        self.last_error = None;
        self.update(|transcript| apply_user_turn(transcript, text));

        let (cancel_token, stream_id) = self.start_new_stream();
        Some(StreamParams {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            transcript: self.transcript.clone(),
            cancel_token,
            stream_id,
        })
    }

    /// Applies one message from the reader task.
    ///
    /// Returns `false` when the message belongs to a stream that is no longer
    /// current and was dropped.
    pub fn apply_stream_message(&mut self, message: StreamMessage, stream_id: u64) -> bool {
        if !self.is_current_stream(stream_id) {
            debug!(stream_id, current = self.current_stream_id, "dropping stale stream message");
            return false;
        }

        match message {
            StreamMessage::Token(text) => {
                self.update(|transcript| apply_token(transcript, &text));
            }
            StreamMessage::Error(err) => {
                error!(stream_id, error = %err, "stream failed");
                self.last_error = Some(err);
                self.loading = false;
            }
            StreamMessage::End => {
                self.stream_cancel_token = None;
                self.loading = false;
            }
        }
        true
    }

    /// Stops the open stream, keeping whatever has already arrived.
    pub fn interrupt(&mut self) {
        self.cancel_current_stream();
    }

    /// Cancels the outstanding read, then clears and persists the transcript.
    pub fn new_session(&mut self) {
        self.cancel_current_stream();
        self.last_error = None;
        self.update(|_| Transcript::new());
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.current_stream_id += 1;
        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        self.loading = true;
        (token, self.current_stream_id)
    }

    fn cancel_current_stream(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            debug!(stream_id = self.current_stream_id, "cancelling open stream");
            token.cancel();
        }
        self.loading = false;
    }

    fn update(&mut self, mutate: impl FnOnce(Transcript) -> Transcript) {
        let transcript = std::mem::take(&mut self.transcript);
        self.transcript = mutate(transcript);
        if let Err(err) = self.store.save(&self.transcript) {
            warn!(error = %err, "failed to persist transcript");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{ChatMessage, Role};
    use crate::core::store::MemoryTranscriptStore;

    fn session_with(store: &MemoryTranscriptStore) -> Session {
        Session::initialize(Box::new(store.clone()), "http://127.0.0.1:1/unused")
    }

    fn stored(store: &MemoryTranscriptStore) -> Transcript {
        store
            .load()
            .expect("stored transcript is valid")
            .unwrap_or_default()
    }

    #[test]
    fn initialize_rehydrates_without_overwriting() {
        let cached = Transcript::from(vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ]);
        let store = MemoryTranscriptStore::with_raw(
            serde_json::to_string(&cached).expect("serialize"),
        );

        let session = session_with(&store);

        assert_eq!(session.transcript(), &cached);
        assert_eq!(stored(&store), cached);
    }

    #[test]
    fn corrupt_cache_starts_empty() {
        let store = MemoryTranscriptStore::with_raw("[{\"role\":");
        let session = session_with(&store);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn blank_submissions_are_ignored() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);

        assert!(session.submit("   \n").is_none());
        assert!(session.transcript().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn submit_persists_user_turn_and_opens_stream() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);

        let params = session.submit("Cheapest city for chips?").expect("params");

        assert!(session.is_loading());
        assert_eq!(params.stream_id, 1);
        assert_eq!(params.transcript.len(), 1);
        assert_eq!(stored(&store), params.transcript);
        assert!(!params.cancel_token.is_cancelled());
    }

    #[test]
    fn tokens_accumulate_and_persist_on_every_mutation() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);
        let params = session.submit("hi").expect("params");

        assert!(session.apply_stream_message(StreamMessage::Token("Hi".into()), params.stream_id));
        assert_eq!(stored(&store).last_assistant_content(), Some("Hi"));

        session.apply_stream_message(StreamMessage::Token(" there".into()), params.stream_id);
        session.apply_stream_message(StreamMessage::End, params.stream_id);

        let roles: Vec<Role> = session.transcript().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.transcript().last_assistant_content(), Some("Hi there"));
        assert_eq!(stored(&store), *session.transcript());
        assert!(!session.is_loading());
    }

    #[test]
    fn errors_clear_loading_and_keep_partial_reply() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);
        let params = session.submit("hi").expect("params");

        session.apply_stream_message(StreamMessage::Token("partial".into()), params.stream_id);
        session.apply_stream_message(StreamMessage::Error("reset".into()), params.stream_id);

        assert!(!session.is_loading());
        assert_eq!(session.last_error(), Some("reset"));
        assert_eq!(session.transcript().last_assistant_content(), Some("partial"));
    }

    #[test]
    fn new_session_cancels_stream_and_drops_late_tokens() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);
        let params = session.submit("hi").expect("params");

        session.new_session();

        assert!(params.cancel_token.is_cancelled());
        assert!(session.transcript().is_empty());
        assert!(stored(&store).is_empty());
        assert!(!session.is_loading());

        assert!(!session.apply_stream_message(StreamMessage::Token("late".into()), params.stream_id));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn second_submit_cancels_first_stream() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);
        let first = session.submit("one").expect("params");
        session.apply_stream_message(StreamMessage::Token("A".into()), first.stream_id);

        let second = session.submit("two").expect("params");
        assert!(first.cancel_token.is_cancelled());
        assert_ne!(first.stream_id, second.stream_id);

        assert!(!session.apply_stream_message(StreamMessage::Token("stale".into()), first.stream_id));
        session.apply_stream_message(StreamMessage::Token("B".into()), second.stream_id);

        let contents: Vec<&str> = session
            .transcript()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "A", "two", "B"]);
    }

    #[test]
    fn interrupt_keeps_transcript() {
        let store = MemoryTranscriptStore::new();
        let mut session = session_with(&store);
        let params = session.submit("hi").expect("params");
        session.apply_stream_message(StreamMessage::Token("so far".into()), params.stream_id);

        session.interrupt();

        assert!(params.cancel_token.is_cancelled());
        assert!(!session.is_loading());
        assert_eq!(session.transcript().last_assistant_content(), Some("so far"));
        assert!(!session.apply_stream_message(StreamMessage::End, params.stream_id));
    }
}
