//! LLM provider implementations
//!
//! Each provider is implemented in its own module; HTTP status handling is
//! shared so every provider reports failures the same way.

pub mod anthropic;
pub mod openai;

// Re-export providers for easy access
pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::error::{PantryChefError, Result};
use reqwest::Response;
use serde::{Deserialize, Serialize};

/// Chat message in the shape both APIs accept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Pass successful responses through, classify the rest
pub(crate) async fn check_status(response: Response, provider: &str, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    Err(classify_status(status.as_u16(), provider, url, &error_text, retry_after))
}

pub(crate) fn classify_status(
    status: u16,
    provider: &str,
    url: &str,
    body: &str,
    retry_after: Option<u64>,
) -> PantryChefError {
    match status {
        401 => PantryChefError::authentication(format!(
            "{} rejected the API key (401). Please check your credentials",
            provider
        )),
        403 => PantryChefError::authentication(format!(
            "Access forbidden (403). Your {} API key may not have permission for this endpoint",
            provider
        )),
        429 => PantryChefError::rate_limit(
            format!("{} rate limit exceeded (429). Please try again later", provider),
            retry_after,
        ),
        500..=599 => PantryChefError::network(
            format!("{} server error ({}). The API service is experiencing issues", provider, status),
            Some(status),
            Some(url.to_string()),
        ),
        _ => PantryChefError::network(
            format!("{} API request failed ({}): {}", provider, status, body),
            Some(status),
            Some(url.to_string()),
        ),
    }
}
