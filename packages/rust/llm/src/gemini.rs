//! Google generative language (Gemini) REST client.

use std::time::Duration;

use async_trait::async_trait;
use gameenrich_shared::ModelConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::{ModelError, TextModel};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("gameenrich/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GeminiModel`].
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Combine the `[model]` config section with an already-resolved key.
    pub fn from_model_config(config: &ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

// Keep the key out of debug output.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Gemini `generateContent` client.
pub struct GeminiModel {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiModel {
    /// Build a client. Fails only on an unusable base URL or TLS setup.
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/models/{}:generateContent", config.model))
            .map_err(|e| {
                ModelError::NotConfigured(format!("invalid base URL '{}': {e}", config.base_url))
            })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model: config.model,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String, ModelError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".into());
            return Err(ModelError::Blocked(reason));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            if matches!(reason.as_str(), "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT") {
                return Err(ModelError::Blocked(reason));
            }
            return Err(ModelError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ModelError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(bytes = body.len(), "model response received");

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| ModelError::Parse(e.to_string()))?;
        parsed.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> GeminiConfig {
        GeminiConfig {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        }
    }

    const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "Genre: Puzzle\n"},
                            {"text": "Description: Rotate falling blocks to clear lines.\nPlayer Mode: Both"}
                        ]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        let text = model.complete("Tell me about Tetris").await.unwrap();

        assert!(text.starts_with("Genre: Puzzle"));
        assert!(text.ends_with("Player Mode: Both"));
        assert_eq!(model.model_name(), "gemini-test");
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        let err = model.complete("prompt").await.unwrap_err();

        assert!(matches!(
            err,
            ModelError::RateLimited {
                retry_after_secs: Some(12)
            }
        ));
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        match model.complete("prompt").await.unwrap_err() {
            ModelError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        let err = model.complete("prompt").await.unwrap_err();
        assert!(matches!(err, ModelError::Blocked(reason) if reason == "SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "   "}]}, "finishReason": "STOP"}]
            })))
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        let err = model.complete("prompt").await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let model = GeminiModel::new(config_for(&server)).unwrap();
        let err = model.complete("prompt").await.unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = GeminiConfig {
            api_key: "k".into(),
            model: "m".into(),
            base_url: "not a url".into(),
            timeout: Duration::from_secs(1),
        };
        let err = GeminiModel::new(config).unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = GeminiConfig::from_model_config(&ModelConfig::default(), "secret-key");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("gemini-2.0-flash-lite"));
    }
}
