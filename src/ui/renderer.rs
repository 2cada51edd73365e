use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::session::Session;
use crate::ui::view::ChatView;
use crate::utils::scroll::wrapped_line_count;

/// Splits the frame into the transcript pane and the bordered input box.
pub fn chat_layout(area: Rect, view: &ChatView) -> (Rect, Rect) {
    let input_height = view.input_height(area.width.saturating_sub(2));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(input_height + 2), // +2 for borders
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Rows of the transcript pane available for text (the title takes one).
pub fn transcript_viewport_height(transcript_area: Rect) -> u16 {
    transcript_area.height.saturating_sub(1)
}

pub fn ui(f: &mut Frame, view: &mut ChatView, session: &Session) {
    let (transcript_area, input_area) = chat_layout(f.area(), view);

    let lines = view.display_lines(session, transcript_area.width);
    let available_height = transcript_viewport_height(transcript_area);
    let total_rows = wrapped_line_count(&lines, transcript_area.width);
    let scroll_offset = view.scroll.resolve(total_rows, available_height);

    let title = format!(
        "Parley v{} - {}",
        env!("CARGO_PKG_VERSION"),
        session.endpoint()
    );

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(Span::styled(title, view.theme.title_style)))
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, transcript_area);

    let input_title = if session.is_loading() {
        "Type your message (Enter to send, Esc to interrupt, Ctrl+N new chat, Ctrl+C to quit)"
    } else {
        "Type your message (Enter to send, Alt+Enter for new line, Ctrl+N new chat, Ctrl+C to quit)"
    };

    let input = Paragraph::new(view.input.as_str())
        .style(view.theme.input_text_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(view.theme.input_border_style)
                .title(Span::styled(input_title, view.theme.input_title_style)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(input, input_area);

    f.set_cursor_position(input_cursor(view, input_area));
}

fn input_cursor(view: &ChatView, input_area: Rect) -> Position {
    let inner_width = input_area.width.saturating_sub(2).max(1);
    let last_line = view.input.rsplit('\n').next().unwrap_or("");
    let last_width = u16::try_from(last_line.width()).unwrap_or(u16::MAX);
    let row = view
        .input_height(inner_width)
        .saturating_sub(1)
        .min(input_area.height.saturating_sub(3));

    Position {
        x: input_area.x + 1 + last_width % inner_width,
        y: input_area.y + 1 + row,
    }
}
