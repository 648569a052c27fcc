//! Markdown code fence detection for model output.
//!
//! Generated SQL is executed as-is by default. These helpers detect fenced
//! output for error hints, and unwrap it when `llm.strip_code_fences` is on.

/// Returns true if the text starts with a markdown code fence.
pub fn is_fenced(text: &str) -> bool {
    text.trim_start().starts_with("```")
}

/// Extracts the content of the first fenced code block.
///
/// The language tag after the opening fence (e.g. `sql`) is dropped. Returns
/// `None` when there is no complete block.
pub fn strip_code_fence(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];

    // The opening fence line ends at the first newline; anything before it is the language tag
    let content_start = after_fence.find('\n')? + 1;
    let content = &after_fence[content_start..];

    let end = content.find("```")?;
    let sql = content[..end].trim();

    (!sql.is_empty()).then(|| sql.to_string())
}
