//! LLM (Large Language Model) integration module
//!
//! Providers only turn a system instruction plus a prompt into raw text.
//! Everything that makes that text a recipe lives in [`generator`].

pub mod generator;
pub mod prompt;
pub mod providers;

// Re-export main functionality
pub use generator::RecipeGenerator;

use crate::error::{PantryChefError, Result};
use crate::types::LlmConfig;
use async_trait::async_trait;

pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Core trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one chat completion and return the model's raw text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get provider name
    fn name(&self) -> &'static str;

    /// Get model name being used
    fn model(&self) -> &str;

    /// Check if provider is configured and ready
    fn is_ready(&self) -> bool;
}

/// Get available LLM providers
pub fn available_providers() -> Vec<&'static str> {
    vec!["perplexity", "openai", "anthropic"]
}

/// Default model for a provider name
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "anthropic" => "claude-3-5-haiku-latest",
        _ => "llama-3.1-sonar-small-128k-online",
    }
}

/// Create an LLM provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LlmProvider>> {
    match config.provider.as_str() {
        "perplexity" => Ok(Box::new(providers::OpenAiProvider::perplexity(config)?)),
        "openai" => Ok(Box::new(providers::OpenAiProvider::new(config)?)),
        "anthropic" => Ok(Box::new(providers::AnthropicProvider::new(config)?)),
        _ => Err(PantryChefError::config(format!(
            "Unsupported LLM provider: {}. Supported providers: {}",
            config.provider,
            available_providers().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, key: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            model: default_model(provider).to_string(),
            api_key: key.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_create_known_providers() {
        let provider = create_provider(&config("perplexity", "pplx-123")).unwrap();
        assert_eq!(provider.name(), "perplexity");
        assert_eq!(provider.model(), "llama-3.1-sonar-small-128k-online");
        assert!(provider.is_ready());

        assert_eq!(create_provider(&config("openai", "sk-1")).unwrap().name(), "openai");
        assert_eq!(create_provider(&config("anthropic", "k")).unwrap().name(), "anthropic");
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            create_provider(&config("gemini", "k")),
            Err(PantryChefError::Config { .. })
        ));
        assert!(matches!(
            create_provider(&config("perplexity", "sk-wrong")),
            Err(PantryChefError::Config { .. })
        ));
        assert!(matches!(
            create_provider(&config("openai", "")),
            Err(PantryChefError::Config { .. })
        ));
    }
}
