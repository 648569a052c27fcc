//! Prompt templates for the two model stages.
//!
//! Both templates are filled in a single pass, so placeholder-like text in
//! the schema, history, or question is never substituted twice.

use crate::history::History;

/// Template for turning a question into one SQL statement.
pub const SQL_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, write a SQL query that would answer the user's question. Take the conversation history into account.

<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}

Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, not even backticks.

For example:
Question: which 3 artists have the most tracks?
SQL Query: SELECT ArtistId, COUNT(*) as track_count FROM Track GROUP BY ArtistId ORDER BY track_count DESC LIMIT 3;

Your turn:

Question: {question}
SQL Query:"#;

/// Template for turning a query result into a natural-language answer.
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, question, SQL query, and sql response, write a natural language response.
<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}
SQL Query: <SQL>{query}</SQL>
User Question: {question}
SQL Response: {response}"#;

/// Renders the SQL generation prompt.
pub fn render_sql_prompt(schema: &str, history: &History, question: &str) -> String {
    let chat_history = history.render_transcript();
    fill(
        SQL_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("chat_history", &chat_history),
            ("question", question),
        ],
    )
}

/// Renders the answer synthesis prompt.
pub fn render_answer_prompt(
    schema: &str,
    history: &History,
    sql: &str,
    question: &str,
    response: &str,
) -> String {
    let chat_history = history.render_transcript();
    fill(
        ANSWER_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("chat_history", &chat_history),
            ("query", sql),
            ("question", question),
            ("response", response),
        ],
    )
}

/// Replaces `{name}` placeholders in one left-to-right pass.
///
/// Unknown placeholders are left as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
