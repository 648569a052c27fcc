//! Mock LLM client for testing.
//!
//! Provides deterministic responses without network access. Responses come
//! from a scripted queue first, then from question patterns, then from
//! built-in defaults for the two prompt stages.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, SqlChatError};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Responses returned in order before any other rule applies.
    script: Arc<Mutex<VecDeque<String>>>,
    /// SQL returned when the question contains the pattern.
    sql_patterns: Vec<(String, String)>,
    /// Error message returned by every call, if set.
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers with `responses`, in order.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(responses.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    /// Creates a mock whose every call fails with an LLM error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns `sql` for SQL prompts whose question contains `pattern`.
    pub fn with_sql(mut self, pattern: impl Into<String>, sql: impl Into<String>) -> Self {
        self.sql_patterns.push((pattern.into(), sql.into()));
        self
    }

    /// Number of completions requested so far, shared across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, shared across clones.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    /// Generates a response for a rendered prompt.
    fn mock_response(&self, prompt: &str) -> String {
        if let Some(next) = self.script.lock().ok().and_then(|mut s| s.pop_front()) {
            return next;
        }

        if let Some(question) = sql_prompt_question(prompt) {
            let question = question.to_lowercase();
            return self
                .sql_patterns
                .iter()
                .find(|(pattern, _)| question.contains(&pattern.to_lowercase()))
                .map(|(_, sql)| sql.clone())
                .unwrap_or_else(|| "SELECT 1;".to_string());
        }

        match prompt.split_once("SQL Response:") {
            Some((_, response)) => format!("Based on the query result: {}", response.trim()),
            None => "I don't understand that question. Could you please rephrase it?".to_string(),
        }
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// Returns the question of a SQL generation prompt.
fn sql_prompt_question(prompt: &str) -> Option<&str> {
    let body = prompt.trim_end().strip_suffix("SQL Query:")?;
    let (_, question) = body.rsplit_once("Question:")?;
    Some(question.trim())
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let input = Self::extract_user_input(messages);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(input.clone());
        }

        if let Some(message) = &self.failure {
            return Err(SqlChatError::llm(message.clone()));
        }

        Ok(self.mock_response(&input))
    }
}
