//! OpenAI-compatible chat completions provider
//!
//! Serves both OpenAI itself and Perplexity, whose API speaks the same
//! protocol at a different base URL.

use crate::error::{PantryChefError, Result};
use crate::llm::{LlmProvider, OPENAI_BASE_URL, PERPLEXITY_BASE_URL};
use crate::types::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{check_status, ChatMessage};

/// OpenAI-compatible provider implementation
pub struct OpenAiProvider {
    client: Client,
    name: &'static str,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(PantryChefError::config("OpenAI API key is required (OPENAI_API_KEY)"));
        }
        Self::build("openai", config, OPENAI_BASE_URL)
    }

    /// Perplexity keys always carry the `pplx-` prefix
    pub fn perplexity(config: &LlmConfig) -> Result<Self> {
        let key = config.api_key.trim();
        if key.is_empty() {
            return Err(PantryChefError::config(
                "Perplexity API key is required (PERPLEXITY_API_KEY)",
            ));
        }
        if !key.starts_with("pplx-") {
            return Err(PantryChefError::config(
                "Perplexity API key is malformed: it must start with 'pplx-'",
            ));
        }
        Self::build("perplexity", config, PERPLEXITY_BASE_URL)
    }

    fn build(name: &'static str, config: &LlmConfig, default_base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PantryChefError::network(e.to_string(), None, None))?;

        Ok(Self {
            client,
            name,
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = self.build_url("/chat/completions");
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return PantryChefError::timeout(format!("{} request", self.name), self.timeout_secs);
                }
                PantryChefError::network(
                    format!("Failed to connect to {} API: {}", self.name, e),
                    None,
                    Some(url.clone()),
                )
            })?;

        let response = check_status(response, self.name, &url).await?;

        let chat: ChatResponse = response.json().await.map_err(|e| {
            PantryChefError::parse(format!("Unexpected {} response: {}", self.name, e), None)
        })?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PantryChefError::parse(format!("No choices in {} response", self.name), None))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// Chat completions API structures
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perplexity_defaults() {
        let config = LlmConfig {
            api_key: " pplx-abc ".to_string(),
            ..LlmConfig::default()
        };
        let provider = OpenAiProvider::perplexity(&config).unwrap();
        assert_eq!(provider.build_url("/chat/completions"), "https://api.perplexity.ai/chat/completions");
        assert_eq!(provider.api_key, "pplx-abc");
        assert_eq!(provider.timeout_secs, 30);
    }

    #[test]
    fn test_timeout_follows_config() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key: "sk-1".to_string(),
            timeout_secs: 90,
            ..LlmConfig::default()
        };
        assert_eq!(OpenAiProvider::new(&config).unwrap().timeout_secs, 90);
    }

    #[test]
    fn test_base_url_override() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key: "sk-1".to_string(),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..LlmConfig::default()
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        assert_eq!(provider.build_url("/chat/completions"), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_response_shape() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content, "{}");
    }
}
