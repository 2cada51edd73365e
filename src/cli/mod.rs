//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, merges them with the stored
//! configuration and runs the selected command.

pub mod normalize;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::normalize::run_normalize;
use crate::cli::say::run_say;
use crate::cli::settings::{describe, set_value, unset_value};
use crate::core::config::data::{path_display, Config};
use crate::core::normalize::NormalizationStrategy;
use crate::core::session::Session;
use crate::core::store::FileTranscriptStore;
use crate::ui::chat_loop::run_chat;
use crate::ui::markdown::RenderConfig;
use crate::ui::theme::Theme;
use crate::ui::view::ChatView;
use crate::utils::logging::{init_tracing, LogTarget};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A terminal chat client for streaming inference endpoints")]
#[command(
    long_about = "Parley is a full-screen terminal chat client. It sends the whole conversation \
to an inference endpoint, streams the reply as it is generated and renders it as compact \
markdown. The conversation is kept between runs.\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Esc               Interrupt the reply being streamed\n\
  Ctrl+N            Start a new chat (clears the saved conversation)\n\
  Up/Down           Scroll one line\n\
  PageUp/PageDown   Scroll one page\n\
  Ctrl+C            Quit the application\n\n\
Environment Variables:\n\
  PARLEY_LOG        Log filter directives (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Endpoint that receives the conversation
    #[arg(short = 'e', long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Markdown normalization applied to replies
    #[arg(short = 's', long, global = true, value_enum)]
    pub strategy: Option<NormalizationStrategy>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and print the reply without starting the interface
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Normalize a markdown file (or stdin) and print the result
    Normalize {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Delete the saved conversation
    Reset,
    /// Set configuration values, or show them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

/// Effective settings after applying command-line overrides to the config.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub endpoint: String,
    pub strategy: NormalizationStrategy,
    pub markdown: bool,
    pub log_file: Option<String>,
}

impl RunSettings {
    pub fn resolve(config: &Config, args: &Args) -> Self {
        Self {
            endpoint: args
                .endpoint
                .clone()
                .unwrap_or_else(|| config.endpoint().to_string()),
            strategy: args.strategy.unwrap_or_else(|| config.normalization()),
            markdown: config.markdown_enabled(),
            log_file: args.log.clone().or_else(|| config.log_file.clone()),
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            markdown: self.markdown,
            strategy: self.strategy,
            width: None,
        }
    }

    /// One-shot commands log to stderr unless a file was asked for.
    fn one_shot_log_target(&self) -> LogTarget {
        match &self.log_file {
            Some(path) => LogTarget::File(path.clone()),
            None => LogTarget::Stderr,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let settings = RunSettings::resolve(&config, &args);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_tracing(LogTarget::for_terminal_ui(settings.log_file.clone()))?;
            let transcript_path = config.resolve_transcript_path()?;
            debug!(path = %path_display(&transcript_path), "using transcript slot");

            let session = Session::initialize(
                Box::new(FileTranscriptStore::new(transcript_path)),
                settings.endpoint.clone(),
            );
            let view = ChatView::new(Theme::dark_default(), settings.render_config());
            run_chat(session, view).await
        }
        Commands::Say { prompt } => {
            init_tracing(settings.one_shot_log_target())?;
            run_say(prompt, &settings).await
        }
        Commands::Normalize { file } => {
            init_tracing(settings.one_shot_log_target())?;
            run_normalize(file, settings.strategy)
        }
        Commands::Reset => {
            init_tracing(settings.one_shot_log_target())?;
            let transcript_path = config.resolve_transcript_path()?;
            FileTranscriptStore::new(&transcript_path).clear()?;
            println!("✅ Cleared conversation at {}", path_display(&transcript_path));
            Ok(())
        }
        Commands::Set { key, value } => {
            let Some(key) = key else {
                println!("Current configuration:");
                for line in describe(&config) {
                    println!("{line}");
                }
                return Ok(());
            };
            match set_value(&mut config, &key, &value) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(1);
                }
            }
        }
        Commands::Unset { key } => match unset_value(&mut config, &key) {
            Ok(message) => {
                config.save()?;
                println!("{message}");
                Ok(())
            }
            Err(err) => {
                err.print();
                std::process::exit(1);
            }
        },
    }
}
