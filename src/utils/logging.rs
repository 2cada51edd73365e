//! Tracing subscriber setup.
//!
//! The interactive chat owns the terminal, so it only ever logs to a file.
//! One-shot commands log to stderr.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::constants::LOG_ENV_VAR;

const DEFAULT_DIRECTIVE: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(String),
    Disabled,
}

impl LogTarget {
    /// Picks the target for an interactive session: a file when one is
    /// configured, otherwise nothing.
    pub fn for_terminal_ui(log_file: Option<String>) -> Self {
        match log_file {
            Some(path) if !path.trim().is_empty() => LogTarget::File(path),
            _ => LogTarget::Disabled,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber. Calling it twice leaves the first one in place.
pub fn init_tracing(target: LogTarget) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    let result = match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    if let Err(err) = result {
        eprintln!("Tracing already initialized: {err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_ui_logs_only_to_files() {
        assert_eq!(LogTarget::for_terminal_ui(None), LogTarget::Disabled);
        assert_eq!(
            LogTarget::for_terminal_ui(Some("  ".to_string())),
            LogTarget::Disabled
        );
        assert_eq!(
            LogTarget::for_terminal_ui(Some("parley.log".to_string())),
            LogTarget::File("parley.log".to_string())
        );
    }
}
