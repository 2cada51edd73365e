use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::constants::{DEFAULT_ENDPOINT, TRANSCRIPT_SLOT};
use crate::core::normalize::NormalizationStrategy;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// URL the transcript is POSTed to
    pub endpoint: Option<String>,
    /// Markdown normalization applied to replies before rendering ("compact" or "flatten")
    pub normalization: Option<NormalizationStrategy>,
    /// Render replies as markdown; when false they are shown as plain text
    pub markdown: Option<bool>,
    /// Location of the persisted transcript (defaults to the platform data directory)
    pub transcript_path: Option<PathBuf>,
    /// File receiving tracing output during interactive sessions
    pub log_file: Option<String>,
}

impl Config {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn normalization(&self) -> NormalizationStrategy {
        self.normalization.unwrap_or_default()
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    /// Resolves the transcript location, falling back to `data_dir`.
    pub fn transcript_path_in(&self, data_dir: &Path) -> PathBuf {
        self.transcript_path
            .clone()
            .unwrap_or_else(|| data_dir.join(TRANSCRIPT_SLOT))
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
