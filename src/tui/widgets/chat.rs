//! Chat panel widget for the TUI.
//!
//! Displays the conversation as labelled turns, with the question being
//! answered shown at the bottom.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::history::Turn;

/// Chat panel widget.
pub struct ChatPanel<'a> {
    turns: &'a [Turn],
    pending: Option<&'a str>,
    scroll: usize,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    ///
    /// `scroll` counts lines up from the bottom.
    pub fn new(turns: &'a [Turn], pending: Option<&'a str>, scroll: usize) -> Self {
        Self {
            turns,
            pending,
            scroll,
        }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        for turn in self.turns {
            push_turn(&mut lines, turn.speaker(), turn.text(), speaker_style(turn));
        }
        if let Some(question) = self.pending {
            push_turn(
                &mut lines,
                "Human",
                question,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            );
            lines.push(Line::from(Span::styled(
                "Thinking...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

fn speaker_style(turn: &Turn) -> Style {
    let color = match turn {
        Turn::Assistant(_) => Color::Green,
        Turn::Human(_) => Color::Cyan,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn push_turn<'a>(lines: &mut Vec<Line<'a>>, speaker: &'a str, text: &'a str, style: Style) {
    lines.push(Line::from(Span::styled(speaker, style)));
    lines.extend(text.lines().map(Line::raw));
    lines.push(Line::default());
}

/// Estimates rendered rows for `lines` wrapped at `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Chat ");

        let lines = self.lines();
        let inner = block.inner(area);
        let total = wrapped_height(&lines, inner.width);
        let bottom = total.saturating_sub(usize::from(inner.height));
        let offset = bottom.saturating_sub(self.scroll);
        let offset = u16::try_from(offset).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0))
            .render(area, buf);
    }
}
