use ratatui::text::Line;
use unicode_width::UnicodeWidthStr;

/// Number of terminal rows `lines` occupy once wrapped to `width` columns.
pub fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| {
            let line_width: usize = line
                .spans
                .iter()
                .map(|span| span.content.width())
                .sum();
            line_width.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Scroll position of the transcript pane.
///
/// Follows the bottom while new content arrives until the user scrolls up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: u16,
    pub follow: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
        }
    }
}

impl ScrollState {
    pub fn max_offset(total_rows: u16, viewport_height: u16) -> u16 {
        total_rows.saturating_sub(viewport_height)
    }

    /// Offset to render with, clamped to the content.
    pub fn resolve(&mut self, total_rows: u16, viewport_height: u16) -> u16 {
        let max = Self::max_offset(total_rows, viewport_height);
        if self.follow {
            self.offset = max;
        }
        self.offset = self.offset.min(max);
        self.offset
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.follow = false;
        self.offset = self.offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16, total_rows: u16, viewport_height: u16) {
        let max = Self::max_offset(total_rows, viewport_height);
        self.offset = self.offset.saturating_add(rows).min(max);
        if self.offset >= max {
            self.follow = true;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
