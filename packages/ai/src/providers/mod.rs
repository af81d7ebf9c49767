//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude and `OpenAI` via a common trait.

pub mod anthropic;
pub mod openai;

use serde::Deserialize;

use crate::AiError;

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends `prompt` as a single instruction and returns the text of the
    /// first completion.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::RateLimited`] on HTTP 429 and another
    /// [`AiError`] variant for any other failure.
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `OPENAI_API_KEY` set -> `OpenAI`
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
///
/// `AI_MODEL` overrides the default model and `AI_BASE_URL` points the
/// `OpenAI` provider at a compatible server.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());
    let model = std::env::var("AI_MODEL").ok().filter(|m| !m.trim().is_empty());

    match provider.to_lowercase().as_str() {
        "openai" | "gpt" => {
            let base_url = std::env::var("AI_BASE_URL").ok().filter(|u| !u.trim().is_empty());
            // Local OpenAI-compatible servers usually ignore the key.
            let api_key = match std::env::var("OPENAI_API_KEY") {
                Ok(key) => key,
                Err(_) if base_url.is_some() => String::new(),
                Err(_) => {
                    return Err(AiError::Config {
                        message: "OPENAI_API_KEY environment variable not set".to_string(),
                    });
                }
            };
            let mut provider = openai::OpenAiProvider::new(
                api_key,
                model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
            );
            if let Some(base_url) = base_url {
                log::info!("Using OpenAI-compatible endpoint at {base_url}");
                provider = provider.with_base_url(base_url);
            }
            Ok(Box::new(provider))
        }
        "anthropic" | "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            Ok(Box::new(anthropic::AnthropicProvider::new(
                api_key,
                model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string()),
            )))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'openai' or 'anthropic'."),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("AI_BASE_URL").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI");
        return "openai".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set OPENAI_API_KEY or ANTHROPIC_API_KEY, \
         or set AI_PROVIDER explicitly."
    );

    // Falls through to a clear error about the missing key.
    "openai".to_string()
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Maps a non-success provider response to an [`AiError`].
///
/// Both supported APIs report failures as `{"error": {"message": ...}}`;
/// anything else is passed through verbatim.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> AiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error.message);

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        AiError::RateLimited { message }
    } else {
        AiError::Provider { message }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn too_many_requests_is_rate_limited() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        match status_error(StatusCode::TOO_MANY_REQUESTS, body) {
            AiError::RateLimited { message } => assert_eq!(message, "Rate limit reached"),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn other_statuses_are_provider_errors() {
        match status_error(StatusCode::BAD_GATEWAY, "upstream down") {
            AiError::Provider { message } => {
                assert_eq!(message, "HTTP 502 Bad Gateway: upstream down");
            }
            other => panic!("expected Provider, got {other:?}"),
        }
    }
}
