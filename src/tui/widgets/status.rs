//! Status line widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

use crate::surface::Status;

/// One-row status line below the chat.
pub struct StatusLine<'a> {
    status: &'a Status,
}

impl<'a> StatusLine<'a> {
    /// Creates a new status line widget.
    pub fn new(status: &'a Status) -> Self {
        Self { status }
    }

    fn style(&self) -> Style {
        match self.status {
            Status::Failed { .. } => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Status::Guidance(_) => Style::default().fg(Color::Yellow),
            Status::Connected(_) => Style::default().fg(Color::Green),
            Status::Connecting(_) | Status::Processing(_) => Style::default().fg(Color::Cyan),
            Status::Disconnected => Style::default().fg(Color::DarkGray),
        }
    }
}

impl Widget for StatusLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let text = format!(" {}", self.status.line());
        buf.set_span(area.x, area.y, &Span::styled(text, self.style()), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlChatError;

    #[test]
    fn test_error_status_text_and_color() {
        let status = Status::from_error(&SqlChatError::query("ERROR 1146: no such table"));
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);

        StatusLine::new(&status).render(area, &mut buf);

        let row: String = (0..area.width).map(|x| buf[(x, 0)].symbol()).collect();
        assert!(row.starts_with(" Query Error: ERROR 1146: no such table"));
        assert_eq!(buf[(1, 0)].fg, Color::Red);
    }
}
