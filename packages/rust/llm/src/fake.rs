//! Fake model for tests and offline runs.
//!
//! Responses are matched by checking whether the prompt contains a
//! registered substring, so tests run without network access or API costs.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ModelError, TextModel};

/// A canned-response model.
///
/// Rules are checked in registration order; failures are checked before
/// responses. Every prompt is recorded so tests can count calls.
#[derive(Debug, Default)]
pub struct FakeModel {
    /// (prompt substring, response) pairs.
    responses: Vec<(String, String)>,
    /// Prompt substrings that make the call fail.
    failures: Vec<String>,
    /// Answer every call as the service does for an invalid API key.
    reject_key: bool,
    /// Response when no rule matches; `None` makes the call fail.
    default_response: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeModel {
    /// A model with no rules; every call fails until rules are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// A model answering `response` to prompts containing `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        Self::new().and_response(prompt_contains, response)
    }

    /// Add a response for prompts containing a substring.
    pub fn and_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    /// Fail every prompt containing a substring, as a network error would.
    pub fn and_failure(mut self, prompt_contains: &str) -> Self {
        self.failures.push(prompt_contains.to_lowercase());
        self
    }

    /// Reject every call with HTTP 401, as for a revoked or mistyped key.
    pub fn with_rejected_key(mut self) -> Self {
        self.reject_key = true;
        self
    }

    /// Set the response used when no rule matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Prompts received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of prompts received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl TextModel for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        if self.reject_key {
            return Err(ModelError::Api {
                status: 401,
                message: "API key not valid. Please pass a valid API key.".into(),
            });
        }

        let prompt_lower = prompt.to_lowercase();

        if let Some(pattern) = self.failures.iter().find(|p| prompt_lower.contains(p.as_str())) {
            return Err(ModelError::RequestFailed(format!(
                "FakeModel: simulated failure for prompt matching {pattern:?}"
            )));
        }

        if let Some((_, response)) = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
        {
            return Ok(response.clone());
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(ModelError::RequestFailed(format!(
                "FakeModel: no response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_model_matching() {
        let model = FakeModel::with_response("tetris", "Genre: Puzzle");
        let result = model.complete("Describe the game 'Tetris'").await.unwrap();
        assert_eq!(result, "Genre: Puzzle");
    }

    #[tokio::test]
    async fn test_fake_model_no_match() {
        let model = FakeModel::new();
        assert!(model.complete("random prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_fake_model_default_response() {
        let model = FakeModel::new().with_default_response("default");
        let result = model.complete("random prompt").await.unwrap();
        assert_eq!(result, "default");
    }

    #[tokio::test]
    async fn test_failure_wins_over_response() {
        let model = FakeModel::with_response("doom", "Genre: Shooter").and_failure("DOOM");
        let err = model.complete("Describe 'Doom'").await.unwrap_err();
        assert!(matches!(err, ModelError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let model = FakeModel::new().with_default_response("ok").with_rejected_key();
        let err = model.complete("anything").await.unwrap_err();
        assert!(matches!(err, ModelError::Api { status: 401, .. }));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let model = FakeModel::new().with_default_response("ok");
        model.complete("first").await.unwrap();
        model.complete("second").await.unwrap();
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.calls(), vec!["first".to_string(), "second".to_string()]);
    }
}
