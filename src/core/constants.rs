//! Shared constants used across the application

/// Prefix that marks a payload line inside a frame.
pub const DATA_MARKER: &str = "data:";

/// Payload value that terminates the stream. Never rendered as text.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Frames are separated by exactly this sequence; a single newline never
/// ends a frame.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Endpoint used when neither the config file nor the command line names one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/query_chatbot";

/// File name of the persisted transcript slot.
pub const TRANSCRIPT_SLOT: &str = "messages.json";

/// Environment variable read for the tracing filter directive.
pub const LOG_ENV_VAR: &str = "PARLEY_LOG";
