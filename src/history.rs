//! Conversation turns and the append-only history of a session.

/// Greeting that opens every conversation.
pub const GREETING: &str = "Hello! I'm a SQL Assistant. Ask me anything about your database.";

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// A question typed by the user.
    Human(String),
    /// A reply produced by the assistant.
    Assistant(String),
}

impl Turn {
    /// Returns the text payload.
    pub fn text(&self) -> &str {
        match self {
            Turn::Human(text) | Turn::Assistant(text) => text,
        }
    }

    /// Speaker label used in prompt transcripts.
    pub fn speaker(&self) -> &'static str {
        match self {
            Turn::Human(_) => "Human",
            Turn::Assistant(_) => "AI",
        }
    }
}

/// Ordered conversation history. Turns can only be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// Creates a history seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::Assistant(GREETING.to_string())],
        }
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Renders the history as a flat transcript, one line per turn.
    pub fn render_transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker(), turn.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_history_has_greeting() {
        let history = History::new();
        assert_eq!(history.turns(), &[Turn::Assistant(GREETING.to_string())]);
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut history = History::new();
        history.push(Turn::Human("first".into()));
        history.push(Turn::Assistant("second".into()));

        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some(&Turn::Assistant("second".into())));
    }

    #[test]
    fn test_render_transcript() {
        let mut history = History::new();
        history.push(Turn::Human("how many customers are there?".into()));

        assert_eq!(
            history.render_transcript(),
            format!("AI: {GREETING}\nHuman: how many customers are there?")
        );
    }
}
