//! Terminal-side state of the chat screen: the input buffer, scroll
//! position and how the transcript is turned into lines.

use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::session::Session;
use crate::ui::markdown::{build_transcript_lines, RenderConfig};
use crate::ui::theme::Theme;
use crate::utils::scroll::{wrapped_line_count, ScrollState};

pub const LOADING_INDICATOR: &str = "Thinking...";
const MAX_INPUT_ROWS: u16 = 6;

pub struct ChatView {
    pub input: String,
    pub scroll: ScrollState,
    pub theme: Theme,
    pub render: RenderConfig,
    pub exit_requested: bool,
}

impl ChatView {
    pub fn new(theme: Theme, render: RenderConfig) -> Self {
        Self {
            input: String::new(),
            scroll: ScrollState::default(),
            theme,
            render,
            exit_requested: false,
        }
    }

    /// Transcript lines followed by the loading indicator or the last error.
    pub fn display_lines(&self, session: &Session, width: u16) -> Vec<Line<'static>> {
        let config = self.render.with_width(Some(width));
        let mut lines = build_transcript_lines(session.transcript(), &self.theme, config);

        if session.is_loading() {
            lines.push(Line::from(Span::styled(
                LOADING_INDICATOR,
                self.theme.loading_indicator_style,
            )));
        }
        if let Some(err) = session.last_error() {
            lines.push(Line::from(Span::styled(
                format!("Error: {err}"),
                self.theme.error_text_style,
            )));
        }
        lines
    }

    pub fn total_rows(&self, session: &Session, width: u16) -> u16 {
        wrapped_line_count(&self.display_lines(session, width), width)
    }

    /// Rows the input box needs inside its borders.
    pub fn input_height(&self, inner_width: u16) -> u16 {
        let width = usize::from(inner_width.max(1));
        let rows: usize = self
            .input
            .split('\n')
            .map(|line| line.width().div_ceil(width).max(1))
            .sum();
        u16::try_from(rows).unwrap_or(u16::MAX).clamp(1, MAX_INPUT_ROWS)
    }

    pub fn insert_str(&mut self, text: &str) {
        let sanitized: String = text
            .replace('\t', "    ")
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .chars()
            .filter(|&c| c == '\n' || !c.is_control())
            .collect();
        self.input.push_str(&sanitized);
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}
