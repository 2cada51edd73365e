//! Terminal rendering of normalized markdown.
//!
//! Parsing is left to `pulldown-cmark`; this module only decides how each
//! node looks, using the styles from [`Theme::style_for`]. Text leaves that
//! are entirely `$`-wrapped are swapped for math spans before ordinary text
//! handling.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::core::message::{ChatMessage, Transcript};
use crate::core::normalize::{normalize, NormalizationStrategy};
use crate::ui::math::{detect_math, MathSpan};
use crate::ui::theme::{NodeKind, Theme};

const DEFAULT_RULE_WIDTH: usize = 40;
const USER_PREFIX: &str = "You: ";

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub markdown: bool,
    pub strategy: NormalizationStrategy,
    pub width: Option<u16>,
}

impl RenderConfig {
    pub fn markdown(strategy: NormalizationStrategy) -> Self {
        Self {
            markdown: true,
            strategy,
            width: None,
        }
    }

    pub fn with_width(mut self, width: Option<u16>) -> Self {
        self.width = width;
        self
    }
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<(bool, Vec<String>)>,
    current_row: Vec<String>,
    current_cell: String,
    in_head: bool,
}

impl TableBuilder {
    fn finish_row(&mut self) {
        let cells = std::mem::take(&mut self.current_row);
        self.rows.push((self.in_head, cells));
    }

    fn render(mut self, theme: &Theme) -> Vec<Line<'static>> {
        let mut math_cells = Vec::new();
        for (row, (_, cells)) in self.rows.iter_mut().enumerate() {
            for (column, cell) in cells.iter_mut().enumerate() {
                if let Some(math) = detect_math(cell) {
                    *cell = math.expression().trim().to_string();
                    math_cells.push((row, column));
                }
            }
        }

        let columns = self.rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for (_, cells) in &self.rows {
            for (index, cell) in cells.iter().enumerate() {
                widths[index] = widths[index].max(cell.width());
            }
        }

        let border = theme.style_for(NodeKind::Table);
        let mut lines = Vec::new();
        let math_style = theme.style_for(NodeKind::InlineMath);
        for (row, (is_head, cells)) in self.rows.iter().enumerate() {
            let cell_style = if *is_head {
                theme.style_for(NodeKind::TableHead)
            } else {
                theme.style_for(NodeKind::TableCell)
            };

            let mut spans = Vec::new();
            for (index, width) in widths.iter().enumerate() {
                if index > 0 {
                    spans.push(Span::styled(" │ ", border));
                }
                let text = cells.get(index).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(text.width());
                let style = if math_cells.contains(&(row, index)) {
                    cell_style.patch(math_style)
                } else {
                    cell_style
                };
                spans.push(Span::styled(format!("{text}{}", " ".repeat(padding)), style));
            }
            lines.push(Line::from(spans));

            if *is_head {
                let separator = widths
                    .iter()
                    .map(|width| "─".repeat(*width))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                lines.push(Line::from(Span::styled(separator, border)));
            }
        }
        lines
    }
}

struct MarkdownRenderer<'t> {
    theme: &'t Theme,
    rule_width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    line_has_text: bool,
    style_stack: Vec<Style>,
    /// Next ordinal for each open list; `None` for bullet lists.
    list_stack: Vec<Option<u64>>,
    in_code_block: bool,
    table: Option<TableBuilder>,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t Theme, width: Option<u16>) -> Self {
        Self {
            theme,
            rule_width: width
                .map(usize::from)
                .unwrap_or(DEFAULT_RULE_WIDTH)
                .min(DEFAULT_RULE_WIDTH * 2),
            lines: Vec::new(),
            current: Vec::new(),
            line_has_text: false,
            style_stack: vec![theme.style_for(NodeKind::Paragraph)],
            list_stack: Vec::new(),
            in_code_block: false,
            table: None,
        }
    }

    fn style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or_else(|| self.theme.style_for(NodeKind::Span))
    }

    fn push_style(&mut self, kind: NodeKind) {
        let style = self.style().patch(self.theme.style_for(kind));
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn push_span(&mut self, text: impl Into<String>, style: Style) {
        self.current.push(Span::styled(text.into(), style));
        self.line_has_text = true;
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
        self.line_has_text = false;
    }

    /// Ends a top-level block with a single blank line.
    fn end_block(&mut self) {
        self.flush_line();
        if self.list_stack.is_empty()
            && self
                .lines
                .last()
                .is_some_and(|line| !line.spans.is_empty())
        {
            self.lines.push(Line::default());
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            let style = self.theme.style_for(NodeKind::Code);
            for (index, part) in text.split('\n').enumerate() {
                if index > 0 {
                    self.flush_line();
                }
                if !part.is_empty() {
                    self.push_span(format!("  {part}"), style);
                }
            }
            return;
        }

        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(text);
            return;
        }

        match detect_math(text) {
            Some(MathSpan::Inline(expr)) => {
                let style = self.style().patch(self.theme.style_for(NodeKind::InlineMath));
                self.push_span(expr.to_string(), style);
            }
            Some(MathSpan::Block(expr)) => {
                let style = self.theme.style_for(NodeKind::BlockMath);
                if self.line_has_text {
                    self.flush_line();
                }
                self.push_span(format!("  {}", expr.trim()), style);
                self.flush_line();
            }
            None => {
                let style = self.style();
                self.push_span(text.to_string(), style);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.line_has_text {
                    self.flush_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.push_style(NodeKind::Heading(heading_depth(level)));
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let (marker, kind) = match self.list_stack.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        (marker, NodeKind::OrderedList)
                    }
                    _ => ("• ".to_string(), NodeKind::UnorderedList),
                };
                let style = self.theme.style_for(kind);
                self.current
                    .push(Span::styled(format!("{}{marker}", "  ".repeat(depth)), style));
            }
            Tag::Table(_) => {
                self.flush_line();
                self.table = Some(TableBuilder::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                }
            }
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Tag::Strong => self.push_style(NodeKind::Strong),
            Tag::Emphasis => self.push_style(NodeKind::Emphasis),
            Tag::Strikethrough => {
                let style = self.style().add_modifier(Modifier::CROSSED_OUT);
                self.style_stack.push(style);
            }
            Tag::Link { .. } => {
                let style = self.style().add_modifier(Modifier::UNDERLINED);
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.push_style(NodeKind::Emphasis);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.list_stack.is_empty() && self.table.is_none() {
                    self.end_block();
                } else {
                    self.flush_line();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.end_block();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.lines.extend(table.render(self.theme));
                }
                self.end_block();
            }
            TagEnd::CodeBlock => {
                self.flush_line();
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::Strong
            | TagEnd::Emphasis
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::BlockQuote(_) => self.pop_style(),
            _ => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(table) = self.table.as_mut() {
                    table.current_cell.push_str(&code);
                } else {
                    let style = self.theme.style_for(NodeKind::Code);
                    self.push_span(code.to_string(), style);
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            // Generated text is laid out line by line, so soft breaks stay breaks.
            Event::SoftBreak | Event::HardBreak => {
                if let Some(table) = self.table.as_mut() {
                    table.current_cell.push(' ');
                } else {
                    self.flush_line();
                }
            }
            Event::Rule => {
                self.flush_line();
                let style = self.theme.style_for(NodeKind::Rule);
                self.lines
                    .push(Line::from(Span::styled("─".repeat(self.rule_width), style)));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                let style = self.theme.style_for(NodeKind::ListItem);
                self.push_span(marker, style);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Renders an already-normalized markdown document.
pub fn render_markdown(document: &str, theme: &Theme, width: Option<u16>) -> Vec<Line<'static>> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = MarkdownRenderer::new(theme, width);
    // Adjacent text pieces form one leaf, so math detection sees all of it.
    for event in TextMergeStream::new(Parser::new_ext(document, options)) {
        renderer.event(event);
    }
    renderer.finish()
}

fn plain_lines(content: &str, style: Style) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

pub fn render_message(message: &ChatMessage, theme: &Theme, config: RenderConfig) -> Vec<Line<'static>> {
    if message.is_user() {
        let mut lines = plain_lines(&message.content, theme.user_text_style);
        if let Some(first) = lines.first_mut() {
            first
                .spans
                .insert(0, Span::styled(USER_PREFIX, theme.user_prefix_style));
        }
        return lines;
    }

    if !config.markdown {
        return plain_lines(&message.content, theme.assistant_text_style);
    }

    let normalized = normalize(&message.content, config.strategy);
    render_markdown(&normalized, theme, config.width)
}

/// Lines for the whole transcript, one blank line between turns.
pub fn build_transcript_lines(
    transcript: &Transcript,
    theme: &Theme,
    config: RenderConfig,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in transcript {
        if message.is_assistant() && message.content.is_empty() {
            continue;
        }
        lines.extend(render_message(message, theme, config));
        lines.push(Line::default());
    }
    lines
}
