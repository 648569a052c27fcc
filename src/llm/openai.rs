//! OpenAI-compatible chat completions client.
//!
//! Implements the LlmClient trait for any endpoint speaking the OpenAI chat
//! completions protocol: OpenAI itself, Groq, and Ollama's `/v1` API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SqlChatError};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI API endpoint.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Groq API endpoint.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default Ollama host.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Client configuration for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Provider name used in error messages.
    pub provider: String,
    /// Full chat completions URL.
    pub url: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Creates a config for OpenAI.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("OpenAI", OPENAI_API_URL, Some(api_key.into()), model)
    }

    /// Creates a config for Groq.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("Groq", GROQ_API_URL, Some(api_key.into()), model)
    }

    /// Creates a config for a local Ollama server at `host`.
    pub fn ollama(host: &str, model: impl Into<String>) -> Self {
        let url = format!("{}/v1/chat/completions", host.trim_end_matches('/'));
        Self::new("Ollama", url, None, model)
    }

    fn new(
        provider: &str,
        url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            url: url.into(),
            api_key,
            model: model.into(),
            temperature: 0.0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// OpenAI-compatible LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SqlChatError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Maps an error status to an LLM error.
    fn parse_error(provider: &str, status: reqwest::StatusCode, body: &str) -> SqlChatError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return SqlChatError::llm(format!(
                "Authentication failed. Check your {provider} API key."
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return SqlChatError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return SqlChatError::llm(format!(
                "{provider} API error: {}",
                error_response.error.message
            ));
        }

        SqlChatError::llm(format!("{provider} API error ({status}): {body}"))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let provider = &self.config.provider;
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.config.temperature,
            stream: false,
        };

        debug!("{provider} request with model {}", self.config.model);

        let mut builder = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SqlChatError::llm("Request timed out. Try again.")
            } else if e.is_connect() {
                SqlChatError::llm(format!(
                    "Failed to connect to {provider} API. Check your network."
                ))
            } else {
                SqlChatError::llm(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SqlChatError::llm(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(provider, status, &body));
        }

        parse_completion(provider, &body)
    }
}

/// Extracts the first choice's content from a response body.
fn parse_completion(provider: &str, body: &str) -> Result<String> {
    let response: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| SqlChatError::llm(format!("Failed to parse response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| SqlChatError::llm(format!("No response from {provider}")))
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
