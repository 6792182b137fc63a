//! Completion service boundary
//!
//! The language-model provider is an opaque text-completion service: send a
//! prompt with sampling parameters, receive free text. It is treated as
//! unreliable; every failure maps to a [`CompletionError`].

use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Completion service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer token; `None` disables the service
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Maximum output length in tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-call deadline in seconds
    pub timeout_secs: u64,
}

impl CompletionSettings {
    /// Per-call deadline
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Request for `prompt` using these sampling parameters
    #[must_use]
    pub fn request(&self, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.into(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1500,
            temperature: 0.8,
            timeout_secs: 30,
        }
    }
}

/// Request sent to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-completion service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `request`, returning the raw response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Client used when no credentials are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCompletionClient;

#[async_trait]
impl CompletionClient for DisabledCompletionClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Err(CompletionError::Unavailable(
            "no completion API key configured".to_string(),
        ))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpCompletionClient {
    /// Create client for `endpoint` authenticating with `api_key`
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout {
                duration_secs: self.timeout_secs,
            }
        } else {
            CompletionError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.map_transport(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Build the client described by `settings`
///
/// Without an API key the service is permanently unavailable.
pub fn client_from_settings(
    settings: &CompletionSettings,
) -> Result<std::sync::Arc<dyn CompletionClient>, CompletionError> {
    match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Ok(std::sync::Arc::new(HttpCompletionClient::new(
            settings.endpoint.clone(),
            key,
            settings.timeout(),
        )?)),
        None => {
            tracing::warn!(
                "No completion API key configured; scenarios will use keyword fallbacks"
            );
            Ok(std::sync::Arc::new(DisabledCompletionClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_build_request() {
        let settings = CompletionSettings::default();
        let request = settings.request("hello");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.max_tokens, 1500);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: CompletionSettings =
            serde_json::from_str(r#"{"model": "local-llm"}"#).unwrap();
        assert_eq!(settings.model, "local-llm");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.api_key.is_none());
    }

    #[tokio::test]
    async fn disabled_client_is_unavailable() {
        let request = CompletionSettings::default().request("prompt");
        let result = DisabledCompletionClient.complete(&request).await;
        assert!(matches!(result, Err(CompletionError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_key_selects_disabled_client() {
        let settings = CompletionSettings {
            api_key: Some(String::new()),
            ..CompletionSettings::default()
        };
        let client = client_from_settings(&settings).unwrap();
        let result = client.complete(&settings.request("prompt")).await;
        assert!(matches!(result, Err(CompletionError::Unavailable(_))));
    }

    #[test]
    fn chat_response_extracts_content() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }
}
