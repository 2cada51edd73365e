//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use ratatui::crossterm::terminal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::RunSettings;
use crate::core::accumulator::{apply_token, apply_user_turn};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::message::{ChatMessage, Transcript};
use crate::ui::markdown::render_message;
use crate::ui::theme::Theme;

pub async fn run_say(prompt: Vec<String>, settings: &RunSettings) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: parley say <prompt>");
        std::process::exit(1);
    }

    let mut transcript = apply_user_turn(Transcript::new(), prompt);
    let params = StreamParams {
        client: reqwest::Client::new(),
        endpoint: settings.endpoint.clone(),
        transcript: transcript.clone(),
        cancel_token: CancellationToken::new(),
        stream_id: 1,
    };

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(params);

    while let Some((message, _)) = rx.recv().await {
        match message {
            StreamMessage::Token(text) => {
                if !settings.markdown {
                    print!("{text}");
                    io::stdout().flush()?;
                }
                transcript = apply_token(transcript, &text);
            }
            StreamMessage::Error(err) => {
                eprintln!("\n\n❌ Error: {err}");
                std::process::exit(1);
            }
            StreamMessage::End => break,
        }
    }

    if !settings.markdown {
        println!();
        return Ok(());
    }

    let reply = transcript.last_assistant_content().unwrap_or_default();
    debug!(chars = reply.len(), "rendering reply");
    let terminal_width = terminal::size().ok().map(|(width, _)| width);
    let rendered = render_message(
        &ChatMessage::assistant(reply),
        &Theme::monochrome(),
        settings.render_config().with_width(terminal_width),
    );
    for line in rendered {
        println!("{line}");
    }

    Ok(())
}
