//! Main chat event loop.
//!
//! Terminal events are read on a blocking task and forwarded over a channel;
//! the loop drains those and the reader-task channel, applies them to the
//! [`Session`] and redraws at most once per frame.

mod keybindings;

pub use self::keybindings::{action_for, apply_action, KeyAction, KeyOutcome, Viewport};

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::chat_stream::{ChatStreamService, StreamReceiver};
use crate::core::session::Session;
use crate::ui::renderer::{chat_layout, transcript_viewport_height, ui};
use crate::ui::view::ChatView;

const MAX_FPS: u64 = 60;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

type ChatTerminal = Terminal<CrosstermBackend<io::Stdout>>;

fn viewport_for(terminal: &ChatTerminal, view: &ChatView) -> io::Result<Viewport> {
    let size = terminal.size()?;
    let (transcript_area, _) = chat_layout(Rect::new(0, 0, size.width, size.height), view);
    Ok(Viewport {
        width: transcript_area.width,
        height: transcript_viewport_height(transcript_area),
    })
}

/// Applies every queued terminal event. Returns whether anything was
/// processed and whether the user asked to quit.
fn process_ui_events(
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    view: &mut ChatView,
    session: &mut Session,
    stream_service: &ChatStreamService,
    viewport: Viewport,
) -> (bool, bool) {
    let mut processed = false;
    while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
        processed = true;
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let Some(action) = action_for(&key) else {
                    continue;
                };
                match apply_action(action, view, session, viewport) {
                    KeyOutcome::Continue => {}
                    KeyOutcome::Spawn(params) => stream_service.spawn_stream(params),
                    KeyOutcome::Exit => return (true, true),
                }
            }
            Event::Paste(text) => view.insert_str(&text),
            _ => {}
        }
    }
    (processed, false)
}

fn process_stream_updates(rx: &mut StreamReceiver, session: &mut Session) -> bool {
    let mut received_any = false;
    while let Ok((message, stream_id)) = rx.try_recv() {
        received_any |= session.apply_stream_message(message, stream_id);
    }
    received_any
}

pub async fn run_chat(mut session: Session, mut view: ChatView) -> Result<(), Box<dyn Error>> {
    info!(endpoint = session.endpoint(), "starting chat");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let (stream_service, mut rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();

    let event_reader_handle = tokio::task::spawn_blocking(move || loop {
        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                        break;
                    }
                }
                Err(err) => debug!(error = %err, "failed to read terminal event"),
            },
            Ok(false) => {
                if event_tx.is_closed() {
                    break;
                }
            }
            Err(err) => {
                debug!(error = %err, "terminal poll failed");
                break;
            }
        }
    });

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        if request_redraw && last_draw.elapsed() >= frame_duration {
            if let Err(err) = terminal.draw(|f| ui(f, &mut view, &session)) {
                break Err(err.into());
            }
            last_draw = Instant::now();
            request_redraw = false;
        }

        let viewport = match viewport_for(&terminal, &view) {
            Ok(viewport) => viewport,
            Err(err) => break Err(err.into()),
        };

        let (events_processed, exit) =
            process_ui_events(&mut event_rx, &mut view, &mut session, &stream_service, viewport);
        if exit || view.exit_requested {
            break Ok(());
        }

        let received_any = process_stream_updates(&mut rx, &mut session);
        if events_processed || received_any {
            request_redraw = true;
        }

        if !events_processed && !received_any {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    // Dropping the receiver stops the reader thread on its next poll.
    drop(event_rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = event_reader_handle.await {
        debug!(error = %err, "event reader task ended abnormally");
    }

    result
}
