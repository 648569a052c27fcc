//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{Result, SqlChatError};
use crate::llm::openai::DEFAULT_OLLAMA_HOST;
use crate::llm::{
    AnthropicClient, AnthropicConfig, LlmClient, LlmProvider, MockLlmClient, OpenAiClient,
    OpenAiConfig,
};

/// Creates an LLM client from the configuration and the process environment.
///
/// The model is resolved in order:
/// 1. `llm.model` from the config file or `--model`
/// 2. `<PROVIDER>_MODEL` (e.g. `GROQ_MODEL`)
/// 3. The provider's default model
///
/// API keys come from `GROQ_API_KEY`, `OPENAI_API_KEY` or `ANTHROPIC_API_KEY`.
/// Ollama reads its address from `OLLAMA_HOST`.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    create_client_with_env(config, |name| std::env::var(name).ok())
}

/// Creates an LLM client, reading environment values through `env`.
pub fn create_client_with_env<F>(config: &LlmConfig, env: F) -> Result<Box<dyn LlmClient>>
where
    F: Fn(&str) -> Option<String>,
{
    let provider: LlmProvider = config.provider.parse().map_err(SqlChatError::config)?;

    let model = config
        .model
        .clone()
        .or_else(|| env(&provider.model_env()))
        .unwrap_or_else(|| provider.default_model().to_string());

    let api_key = match provider.api_key_env() {
        Some(var) => Some(env(var).filter(|k| !k.is_empty()).ok_or_else(|| {
            SqlChatError::llm(format!("No API key configured. Set {var}."))
        })?),
        None => None,
    };

    let key = api_key.unwrap_or_default();

    match provider {
        LlmProvider::Groq => Ok(Box::new(OpenAiClient::new(openai_like(
            OpenAiConfig::groq(key, model),
            config,
        ))?)),
        LlmProvider::OpenAi => Ok(Box::new(OpenAiClient::new(openai_like(
            OpenAiConfig::openai(key, model),
            config,
        ))?)),
        LlmProvider::Ollama => {
            let host = env("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
            Ok(Box::new(OpenAiClient::new(openai_like(
                OpenAiConfig::ollama(&host, model),
                config,
            ))?))
        }
        LlmProvider::Anthropic => Ok(Box::new(AnthropicClient::new(
            AnthropicConfig::new(key, model)
                .with_temperature(config.temperature)
                .with_timeout(config.timeout_secs),
        )?)),
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

fn openai_like(base: OpenAiConfig, config: &LlmConfig) -> OpenAiConfig {
    base.with_temperature(config.temperature)
        .with_timeout(config.timeout_secs)
}
