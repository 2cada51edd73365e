//! `parley set` / `parley unset` handling.
//!
//! Each key is described by a data-driven [`SettingHandler`] that knows how
//! to parse, store, clear and display its value.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::config::data::{path_display, Config};
use crate::core::normalize::NormalizationStrategy;

#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    InvalidBoolean(String),
    InvalidValue {
        key: &'static str,
        input: String,
        hint: &'static str,
    },
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
}

impl SettingError {
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Known keys: {}", known_keys().join(", "));
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no)");
            }
            SettingError::InvalidValue { key, input, hint } => {
                eprintln!("❌ Invalid value for {key}: {input}");
                eprintln!("   {hint}");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidBoolean(input) => write!(f, "Invalid boolean value: {input}"),
            SettingError::InvalidValue { key, input, .. } => {
                write!(f, "Invalid value for {key}: {input}")
            }
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
        }
    }
}

impl std::error::Error for SettingError {}

/// Accepts on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub struct SettingHandler {
    pub key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    store: fn(&mut Config, &str) -> Result<(), SettingError>,
    clear: fn(&mut Config),
    current: fn(&Config) -> Option<String>,
}

impl SettingHandler {
    pub fn set(&self, config: &mut Config, args: &[String]) -> Result<String, SettingError> {
        let input = args.join(" ");
        let input = input.trim();
        if input.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        (self.store)(config, input)?;
        let shown = (self.current)(config).unwrap_or_else(|| input.to_string());
        Ok(format!("✅ Set {} to: {shown}", self.key))
    }

    pub fn unset(&self, config: &mut Config) -> String {
        (self.clear)(config);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        )
    }

    pub fn format(&self, config: &Config) -> String {
        match (self.current)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

fn store_endpoint(config: &mut Config, input: &str) -> Result<(), SettingError> {
    if !(input.starts_with("http://") || input.starts_with("https://")) {
        return Err(SettingError::InvalidValue {
            key: "endpoint",
            input: input.to_string(),
            hint: "The endpoint must be an http:// or https:// URL",
        });
    }
    config.endpoint = Some(input.to_string());
    Ok(())
}

fn store_normalization(config: &mut Config, input: &str) -> Result<(), SettingError> {
    let strategy =
        NormalizationStrategy::from_str(input).map_err(|_| SettingError::InvalidValue {
            key: "normalization",
            input: input.to_string(),
            hint: "Use 'compact' or 'flatten'",
        })?;
    config.normalization = Some(strategy);
    Ok(())
}

fn store_markdown(config: &mut Config, input: &str) -> Result<(), SettingError> {
    let value = parse_bool(input).ok_or_else(|| SettingError::InvalidBoolean(input.to_string()))?;
    config.markdown = Some(value);
    Ok(())
}

/// Registered keys in display order.
pub fn handlers() -> [SettingHandler; 5] {
    [
        SettingHandler {
            key: "endpoint",
            hint: "To set the endpoint, specify a URL:",
            example: "parley set endpoint http://127.0.0.1:8000/query_chatbot",
            default_display: crate::core::constants::DEFAULT_ENDPOINT,
            store: store_endpoint,
            clear: |c| c.endpoint = None,
            current: |c| c.endpoint.clone(),
        },
        SettingHandler {
            key: "normalization",
            hint: "To set the normalization strategy, specify compact or flatten:",
            example: "parley set normalization flatten",
            default_display: "compact",
            store: store_normalization,
            clear: |c| c.normalization = None,
            current: |c| c.normalization.map(|s| s.to_string()),
        },
        SettingHandler {
            key: "markdown",
            hint: "To set markdown rendering, specify on or off:",
            example: "parley set markdown off",
            default_display: "on",
            store: store_markdown,
            clear: |c| c.markdown = None,
            current: |c| c.markdown.map(|v| format_bool(v).to_string()),
        },
        SettingHandler {
            key: "transcript-path",
            hint: "To move the transcript, specify a file path:",
            example: "parley set transcript-path ~/notes/parley.json",
            default_display: "platform data directory",
            store: |c, input| {
                c.transcript_path = Some(PathBuf::from(input));
                Ok(())
            },
            clear: |c| c.transcript_path = None,
            current: |c| c.transcript_path.as_ref().map(path_display),
        },
        SettingHandler {
            key: "log-file",
            hint: "To log interactive sessions, specify a file path:",
            example: "parley set log-file parley.log",
            default_display: "none",
            store: |c, input| {
                c.log_file = Some(input.to_string());
                Ok(())
            },
            clear: |c| c.log_file = None,
            current: |c| c.log_file.clone(),
        },
    ]
}

pub fn known_keys() -> Vec<&'static str> {
    handlers().iter().map(|h| h.key).collect()
}

pub fn set_value(config: &mut Config, key: &str, args: &[String]) -> Result<String, SettingError> {
    let handlers = handlers();
    let handler = handlers
        .iter()
        .find(|h| h.key == key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    handler.set(config, args)
}

pub fn unset_value(config: &mut Config, key: &str) -> Result<String, SettingError> {
    let handlers = handlers();
    let handler = handlers
        .iter()
        .find(|h| h.key == key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    Ok(handler.unset(config))
}

pub fn describe(config: &Config) -> Vec<String> {
    handlers().iter().map(|h| h.format(config)).collect()
}
