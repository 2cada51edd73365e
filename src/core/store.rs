//! Persistence for the transcript.
//!
//! The transcript lives in a single slot holding its JSON array form. It is
//! read once when a session starts and overwritten after every mutation.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::config::data::path_display;
use crate::core::message::Transcript;

#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the slot failed.
    Io { path: PathBuf, source: std::io::Error },

    /// The slot holds something that is not a transcript.
    Corrupt { source: serde_json::Error },

    /// The transcript could not be encoded.
    Encode { source: serde_json::Error },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "Transcript store I/O error at {}: {}", path_display(path), source)
            }
            StoreError::Corrupt { source } => {
                write!(f, "Stored transcript is not valid: {source}")
            }
            StoreError::Encode { source } => {
                write!(f, "Failed to encode transcript: {source}")
            }
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Corrupt { source } | StoreError::Encode { source } => Some(source),
        }
    }
}

pub trait TranscriptStore: Send {
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Transcript>, StoreError>;

    fn save(&mut self, transcript: &Transcript) -> Result<(), StoreError>;
}

/// Loads the stored transcript, treating a missing or unreadable slot as an
/// empty conversation.
pub fn load_or_empty(store: &dyn TranscriptStore) -> Transcript {
    match store.load() {
        Ok(Some(transcript)) => transcript,
        Ok(None) => Transcript::new(),
        Err(err) => {
            warn!(error = %err, "discarding unreadable transcript cache");
            Transcript::new()
        }
    }
}

fn decode(contents: &str) -> Result<Option<Transcript>, StoreError> {
    if contents.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(contents)
        .map(Some)
        .map_err(|source| StoreError::Corrupt { source })
}

/// Stores the transcript as a JSON file, replacing it atomically on save.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    path: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Removes the slot entirely.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn load(&self) -> Result<Option<Transcript>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => decode(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&mut self, transcript: &Transcript) -> Result<(), StoreError> {
        let contents =
            serde_json::to_string(transcript).map_err(|source| StoreError::Encode { source })?;

        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;
        }

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| self.io_error(err))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|err| self.io_error(err))?;
        temp_file
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose slot already holds `raw`, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn load(&self) -> Result<Option<Transcript>, StoreError> {
        match self.raw() {
            Some(contents) => decode(&contents),
            None => Ok(None),
        }
    }

    fn save(&mut self, transcript: &Transcript) -> Result<(), StoreError> {
        let contents =
            serde_json::to_string(transcript).map_err(|source| StoreError::Encode { source })?;
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(contents);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ChatMessage;
    use tempfile::TempDir;

    fn sample() -> Transcript {
        Transcript::from(vec![
            ChatMessage::user("How much is a brownie in Denver?"),
            ChatMessage::assistant("About **$3.25**."),
        ])
    }

    #[test]
    fn file_store_round_trips_and_creates_parent_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("messages.json");
        let mut store = FileTranscriptStore::new(&path);

        assert!(store.load().expect("load").is_none());

        store.save(&sample()).expect("save");
        assert!(path.exists());
        assert_eq!(store.load().expect("load"), Some(sample()));
    }

    #[test]
    fn file_store_overwrites_previous_contents() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut store = FileTranscriptStore::new(temp_dir.path().join("messages.json"));

        store.save(&sample()).expect("save");
        store.save(&Transcript::new()).expect("save");

        assert_eq!(store.load().expect("load"), Some(Transcript::new()));
    }

    #[test]
    fn corrupt_file_reports_error_but_loads_as_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("messages.json");
        fs::write(&path, "{not json").expect("write");
        let store = FileTranscriptStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
        assert!(load_or_empty(&store).is_empty());
    }

    #[test]
    fn incompatible_shape_is_treated_as_corrupt() {
        let store = MemoryTranscriptStore::with_raw(r#"{"messages": []}"#);
        assert!(store.load().is_err());
        assert!(load_or_empty(&store).is_empty());
    }

    #[test]
    fn clear_removes_slot_and_tolerates_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut store = FileTranscriptStore::new(temp_dir.path().join("messages.json"));
        store.save(&sample()).expect("save");

        store.clear().expect("clear");
        assert!(!store.path().exists());
        store.clear().expect("second clear");
    }

    #[test]
    fn memory_store_clones_share_slot() {
        let store = MemoryTranscriptStore::new();
        let mut writer = store.clone();
        writer.save(&sample()).expect("save");

        assert_eq!(store.load().expect("load"), Some(sample()));
        assert!(store.raw().is_some_and(|raw| raw.starts_with('[')));
    }
}
