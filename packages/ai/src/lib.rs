#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safety advisories for accident hotspots.
//!
//! Supports `OpenAI` (and any `OpenAI`-compatible server such as Ollama,
//! vLLM, or LM Studio via the `AI_BASE_URL` environment variable) and
//! Anthropic Claude behind the [`providers::LlmProvider`] trait. The
//! [`annotate`] module asks the provider for a short prevention tip for
//! each severe hotspot, retrying rate-limited calls and isolating
//! failures per location.

pub mod annotate;
pub mod providers;

use accident_map_retry::Retryable;
use thiserror::Error;

pub use annotate::{AnnotateOptions, AnnotationReport, annotate_hotspots, build_prompt};
pub use providers::{LlmProvider, create_provider_from_env};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider answered with HTTP 429.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Provider's error message.
        message: String,
    },

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

impl Retryable for AiError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_retryable() {
        assert!(
            AiError::RateLimited {
                message: "slow down".to_string()
            }
            .is_retryable()
        );
        assert!(
            !AiError::Provider {
                message: "bad model".to_string()
            }
            .is_retryable()
        );
        assert!(
            !AiError::Config {
                message: "no key".to_string()
            }
            .is_retryable()
        );
    }
}
