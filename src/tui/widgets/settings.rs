//! Connection settings widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::tui::app::SettingsForm;

/// Sidebar form with the connection settings.
pub struct SettingsPanel<'a> {
    form: &'a SettingsForm,
    focused: bool,
}

impl<'a> SettingsPanel<'a> {
    /// Creates a new settings panel widget.
    pub fn new(form: &'a SettingsForm, focused: bool) -> Self {
        Self { form, focused }
    }
}

impl Widget for SettingsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Connection ");

        let label_style = Style::default().fg(Color::Gray);
        let selected_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = self
            .form
            .visible_fields()
            .iter()
            .map(|field| {
                let selected = self.focused && *field == self.form.selected;
                let marker = if selected { "> " } else { "  " };
                let style = if selected { selected_style } else { label_style };
                Line::from(vec![
                    Span::styled(
                        format!("{marker}{:<9}", field.label(self.form.backend)),
                        style,
                    ),
                    Span::raw(self.form.display_value(*field)),
                ])
            })
            .collect();

        lines.push(Line::default());
        let hint = if self.focused {
            "Enter: connect  Up/Down: field"
        } else {
            "Tab: edit connection"
        };
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
