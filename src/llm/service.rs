//! LLM service for the two-stage question → SQL → answer pipeline.
//!
//! Each stage renders its prompt template and sends it to the model as a
//! single user message. Neither stage retries or post-validates output.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::history::History;

use super::prompt::{render_answer_prompt, render_sql_prompt};
use super::{LlmClient, Message};

/// LLM service wrapping one text-completion client.
pub struct LlmService {
    client: Box<dyn LlmClient>,
}

impl LlmService {
    /// Creates a new LLM service.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Generates one SQL statement for the question.
    ///
    /// Only surrounding whitespace is trimmed from the model output.
    pub async fn generate_sql(
        &self,
        question: &str,
        history: &History,
        schema: &str,
    ) -> Result<String> {
        let prompt = render_sql_prompt(schema, history, question);
        debug!(prompt_len = prompt.len(), "Requesting SQL generation");

        let start = Instant::now();
        let sql = self.complete(prompt).await?.trim().to_string();

        info!(
            duration_ms = start.elapsed().as_millis(),
            sql_len = sql.len(),
            "Generated SQL"
        );
        Ok(sql)
    }

    /// Turns a query result into a natural-language answer.
    ///
    /// The model output is returned unmodified.
    pub async fn synthesize_answer(
        &self,
        question: &str,
        history: &History,
        sql: &str,
        schema: &str,
        query_result: &str,
    ) -> Result<String> {
        let prompt = render_answer_prompt(schema, history, sql, question, query_result);
        debug!(prompt_len = prompt.len(), "Requesting answer synthesis");

        let start = Instant::now();
        let answer = self.complete(prompt).await?;

        info!(
            duration_ms = start.elapsed().as_millis(),
            answer_len = answer.len(),
            "Synthesized answer"
        );
        Ok(answer)
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        self.client.complete(&[Message::user(prompt)]).await
    }
}
