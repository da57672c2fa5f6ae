//! Generative text model abstraction.
//!
//! The enricher only needs one capability from a model service: send a
//! prompt, get text back. [`TextModel`] is that seam. [`GeminiModel`] talks
//! to Google's generative language REST API; [`FakeModel`] answers from
//! canned responses so parsing and pipeline logic can be tested offline.

mod fake;
mod gemini;

pub use fake::FakeModel;
pub use gemini::{GeminiConfig, GeminiModel};

use std::fmt;

use async_trait::async_trait;
use gameenrich_shared::GameEnrichError;
use thiserror::Error;

/// Error type for model calls.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("prompt blocked by the service: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("model not configured: {0}")]
    NotConfigured(String),
}

impl From<ModelError> for GameEnrichError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::RequestFailed(msg) => GameEnrichError::Network(msg),
            ModelError::NotConfigured(msg) => GameEnrichError::config(msg),
            ModelError::Parse(msg) => GameEnrichError::parse(msg),
            ModelError::Api { status, message } if is_key_rejection(status, &message) => {
                GameEnrichError::Credential(format!(
                    "model service rejected the API key ({status}): {message}"
                ))
            }
            other => GameEnrichError::Model(other.to_string()),
        }
    }
}

/// 401/403, or the 400 Gemini sends for a malformed key.
fn is_key_rejection(status: u16, message: &str) -> bool {
    matches!(status, 401 | 403)
        || (status == 400 && message.to_ascii_lowercase().contains("api key"))
}

/// A prompt-in, text-out model.
///
/// Implementations hold no per-call state; one `complete` call is exactly
/// one outbound request.
#[async_trait]
pub trait TextModel: Send + Sync + fmt::Debug {
    /// Send a prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_maps_to_row_level_errors() {
        let err: GameEnrichError = ModelError::RequestFailed("connection reset".into()).into();
        assert!(matches!(err, GameEnrichError::Network(_)));
        assert!(!err.is_fatal());

        let err: GameEnrichError = ModelError::RateLimited {
            retry_after_secs: Some(30),
        }
        .into();
        assert!(matches!(err, GameEnrichError::Model(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn rejected_key_is_fatal() {
        for status in [401, 403] {
            let err: GameEnrichError = ModelError::Api {
                status,
                message: "API key not valid".into(),
            }
            .into();
            assert!(matches!(err, GameEnrichError::Credential(_)));
            assert!(err.is_fatal());
        }

        let err: GameEnrichError = ModelError::Api {
            status: 400,
            message: "API key not valid. Please pass a valid API key.".into(),
        }
        .into();
        assert!(err.is_fatal());

        let err: GameEnrichError = ModelError::Api {
            status: 400,
            message: "Invalid JSON payload".into(),
        }
        .into();
        assert!(!err.is_fatal());

        let err: GameEnrichError = ModelError::Api {
            status: 500,
            message: "internal".into(),
        }
        .into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn unparseable_body_is_row_level() {
        let err: GameEnrichError = ModelError::Parse("expected value".into()).into();
        assert!(matches!(err, GameEnrichError::Parse { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn not_configured_is_fatal() {
        let err: GameEnrichError = ModelError::NotConfigured("bad base url".into()).into();
        assert!(err.is_fatal());
    }
}
