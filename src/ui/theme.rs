use ratatui::style::{Color, Modifier, Style};

/// Kinds of markdown node the renderer knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Heading(u8),
    OrderedList,
    UnorderedList,
    ListItem,
    Rule,
    Paragraph,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Span,
    Strong,
    Emphasis,
    Code,
    InlineMath,
    BlockMath,
}

/// Display table for transcript rendering: one style per [`NodeKind`] plus
/// the chrome around the chat.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color,

    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub error_text_style: Style,

    // Markdown nodes
    pub heading_styles: [Style; 3],
    pub list_marker_style: Style,
    pub rule_style: Style,
    pub table_border_style: Style,
    pub table_header_style: Style,
    pub code_style: Style,
    pub math_style: Style,

    // Chrome
    pub title_style: Style,
    pub loading_indicator_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Reset,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            error_text_style: Style::default().fg(Color::Red),

            heading_styles: [
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ],
            list_marker_style: Style::default().fg(Color::Gray),
            rule_style: Style::default().fg(Color::DarkGray),
            table_border_style: Style::default().fg(Color::DarkGray),
            table_header_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            code_style: Style::default().fg(Color::Yellow),
            math_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),

            title_style: Style::default().fg(Color::Gray),
            loading_indicator_style: Style::default().fg(Color::Blue),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            input_text_style: Style::default().fg(Color::White),
        }
    }

    /// Plain theme for output that is not a full-screen terminal.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Theme {
            background_color: Color::Reset,
            user_prefix_style: bold,
            user_text_style: plain,
            assistant_text_style: plain,
            error_text_style: plain,
            heading_styles: [bold, bold, bold],
            list_marker_style: plain,
            rule_style: plain,
            table_border_style: plain,
            table_header_style: bold,
            code_style: plain,
            math_style: Style::default().add_modifier(Modifier::ITALIC),
            title_style: plain,
            loading_indicator_style: plain,
            input_border_style: plain,
            input_title_style: plain,
            input_text_style: plain,
        }
    }

    /// Style for a node, patched on top of the assistant base style.
    pub fn style_for(&self, kind: NodeKind) -> Style {
        let base = self.assistant_text_style;
        match kind {
            NodeKind::Heading(level) => {
                let index = usize::from(level.clamp(1, 3) - 1);
                base.patch(self.heading_styles[index])
            }
            NodeKind::OrderedList | NodeKind::UnorderedList => base.patch(self.list_marker_style),
            NodeKind::Rule => base.patch(self.rule_style),
            NodeKind::Table | NodeKind::TableRow => base.patch(self.table_border_style),
            NodeKind::TableHead => base.patch(self.table_header_style),
            NodeKind::Strong => Style::default().add_modifier(Modifier::BOLD),
            NodeKind::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
            NodeKind::Code => base.patch(self.code_style),
            NodeKind::InlineMath | NodeKind::BlockMath => base.patch(self.math_style),
            NodeKind::ListItem | NodeKind::Paragraph | NodeKind::TableCell | NodeKind::Span => {
                base
            }
        }
    }
}
