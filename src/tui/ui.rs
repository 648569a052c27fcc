//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chat, header, input, settings, status};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content, status, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Content (chat + settings)
            Constraint::Length(1), // Status
            Constraint::Length(3), // Input
        ])
        .split(area);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70), // Chat panel
            Constraint::Percentage(30), // Connection settings
        ])
        .split(main_layout[1]);

    render_header(frame, main_layout[0], app);
    render_chat(frame, content_layout[0], app);
    render_settings(frame, content_layout[1], app);
    frame.render_widget(status::StatusLine::new(&app.status), main_layout[2]);
    render_input(frame, main_layout[3], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(app.connection_label(), app.pending_question().is_some());
    frame.render_widget(widget, area);
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let widget = chat::ChatPanel::new(&app.turns, app.pending_question(), app.chat_scroll);
    frame.render_widget(widget, area);
}

fn render_settings(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Settings;
    frame.render_widget(settings::SettingsPanel::new(&app.settings, focused), area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, focused);
    frame.render_widget(widget, area);

    if focused {
        // Account for border (1) and prompt "> " (2)
        let available = area.width.saturating_sub(5) as usize;
        let visible_cursor = app.input.cursor - input::calculate_scroll_offset(app.input.cursor, available);
        let cursor_x = area.x + 1 + 2 + visible_cursor as u16;
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::history::{History, Turn};
    use crate::surface::Status;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_initial_screen() {
        let app = App::new(&ConnectionConfig::default());

        let screen = draw(&app);

        assert!(screen.contains("sqlchat v"));
        assert!(screen.contains("Hello! I'm a SQL Assistant."));
        assert!(screen.contains("Not connected"));
        assert!(screen.contains(" Connection "));
        assert!(screen.contains("> "));
    }

    #[test]
    fn test_answered_turn_and_status() {
        let mut app = App::new(&ConnectionConfig::default());
        let mut history = History::new();
        history.push(Turn::Human("how many customers are there?".into()));
        history.push(Turn::Assistant("There are 5 customers.".into()));
        app.set_history(&history);
        app.set_status(Status::Connected("shop @ localhost:3306".into()));

        let screen = draw(&app);

        assert!(screen.contains("Human"));
        assert!(screen.contains("There are 5 customers."));
        assert!(screen.contains("Connected to shop @ localhost:3306"));
        assert!(screen.contains("[db: shop @ localhost:3306]"));
    }
}
