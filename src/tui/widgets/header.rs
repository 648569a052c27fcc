//! Header widget for the TUI.
//!
//! Displays the application name, version, and database connection info.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
    processing: bool,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: Option<&'a str>, processing: bool) -> Self {
        Self {
            connection_info,
            processing,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" sqlchat v{}", env!("CARGO_PKG_VERSION"));
        buf.set_span(area.x, area.y, &Span::styled(left_text, style), area.width);

        if self.processing {
            let text = "Thinking...";
            let x = area.x + area.width.saturating_sub(text.len() as u16) / 2;
            buf.set_string(x, area.y, text, style.fg(Color::Yellow));
        }

        // Right side: connection status dot and label
        let (dot, color, info) = match self.connection_info {
            Some(info) => ("●", Color::Green, info),
            None => ("○", Color::Gray, "not connected"),
        };
        let db_text = format!(" [db: {info}] ");
        let right_width = db_text.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, dot, style.fg(color));
            buf.set_string(right_x + 2, area.y, &db_text, style);
        }
    }
}
