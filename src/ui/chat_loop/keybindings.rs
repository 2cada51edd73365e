//! Maps key presses to chat actions and applies them.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::chat_stream::StreamParams;
use crate::core::session::Session;
use crate::ui::view::ChatView;

const LINE_SCROLL: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    NewSession,
    Interrupt,
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    InsertChar(char),
    InsertNewline,
    Backspace,
}

pub fn action_for(key: &KeyEvent) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let action = match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('n') if ctrl => KeyAction::NewSession,
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::Char(c) => KeyAction::InsertChar(c),
        KeyCode::Enter if alt => KeyAction::InsertNewline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Esc => KeyAction::Interrupt,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Up => KeyAction::ScrollUp,
        KeyCode::Down => KeyAction::ScrollDown,
        KeyCode::PageUp => KeyAction::PageUp,
        KeyCode::PageDown => KeyAction::PageDown,
        _ => return None,
    };
    Some(action)
}

/// Size of the transcript pane the scroll actions work against.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

pub enum KeyOutcome {
    Continue,
    Spawn(StreamParams),
    Exit,
}

pub fn apply_action(
    action: KeyAction,
    view: &mut ChatView,
    session: &mut Session,
    viewport: Viewport,
) -> KeyOutcome {
    match action {
        KeyAction::Quit => {
            session.interrupt();
            view.exit_requested = true;
            return KeyOutcome::Exit;
        }
        KeyAction::Submit => {
            let text = view.take_input();
            if let Some(params) = session.submit(&text) {
                view.scroll.reset();
                return KeyOutcome::Spawn(params);
            }
            // Nothing was sent, keep what was typed.
            view.input = text;
        }
        KeyAction::NewSession => {
            session.new_session();
            view.scroll.reset();
        }
        KeyAction::Interrupt => session.interrupt(),
        KeyAction::ScrollUp => view.scroll.scroll_up(LINE_SCROLL),
        KeyAction::PageUp => view.scroll.scroll_up(viewport.height.max(1)),
        KeyAction::ScrollDown | KeyAction::PageDown => {
            let rows = if action == KeyAction::PageDown {
                viewport.height.max(1)
            } else {
                LINE_SCROLL
            };
            let total = view.total_rows(session, viewport.width);
            view.scroll.scroll_down(rows, total, viewport.height);
        }
        KeyAction::InsertChar(c) => view.input.push(c),
        KeyAction::InsertNewline => view.input.push('\n'),
        KeyAction::Backspace => {
            view.input.pop();
        }
    }
    KeyOutcome::Continue
}
