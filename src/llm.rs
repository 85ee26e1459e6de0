//! Completion provider client: chat-completions wire types and transport.
//!
//! One client serves both call shapes the pipeline needs — the
//! JSON-constrained intent resolution call and the free-text report
//! synthesis call. The [`CompletionBackend`] trait is the seam the
//! intent resolver and report synthesizer are generic over, so their
//! tests run against mock backends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// A single completion request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System role instructions.
    pub system: String,
    /// User prompt.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Token budget; `None` leaves the provider default.
    pub max_tokens: Option<u32>,
    /// Constrain the response to a JSON object.
    pub json_mode: bool,
}

/// A pluggable completion provider.
pub trait CompletionBackend: Send + Sync {
    /// Run one completion and return the assistant message content.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Provider`] when the provider is
    /// unreachable or errors, or [`PipelineError::Parse`] when the
    /// response lacks a usable choice. Callers recover with their own
    /// documented fallbacks.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

/// HTTP completion client for an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    /// Build a completion client from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| PipelineError::Http(format!("failed to build completion client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.completion_endpoint.clone(),
            api_key: config.completion_api_key.clone(),
            model: config.completion_model.clone(),
        })
    }
}

impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Provider(format!("completion request failed: {e}")))?
            .error_for_status()
            .map_err(|e| PipelineError::Provider(format!("completion HTTP error: {e}")))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Parse(format!("completion response parse failed: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Parse("completion response has no choices".into()))?;

        tracing::trace!(chars = content.len(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serialisation_json_mode() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: 0.3,
            max_tokens: None,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn chat_request_serialisation_free_text() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            temperature: 0.4,
            max_tokens: Some(2500),
            response_format: None,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["max_tokens"], 2500);
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("deserialize");
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[test]
    fn chat_response_tolerates_missing_choices() {
        let parsed: ChatResponse = serde_json::from_str("{}").expect("deserialize");
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(HttpCompletionClient::new(&PipelineConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_returns_provider_error() {
        let config = PipelineConfig {
            // Reserved TEST-NET-1 address; request fails fast.
            completion_endpoint: "http://192.0.2.1/v1/chat/completions".into(),
            ..Default::default()
        };
        let mut client = HttpCompletionClient::new(&config).expect("client should build");
        // Shrink the timeout so the test does not hang on slow networks.
        client.client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("client");
        let result = client
            .complete(CompletionRequest {
                system: "s".into(),
                user: "u".into(),
                temperature: 0.3,
                max_tokens: None,
                json_mode: false,
            })
            .await;
        assert!(matches!(result, Err(PipelineError::Provider(_))));
    }
}
