//! Claude API client used by the chat relay.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ClaudeError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_MAX_TOKENS: u32 = 800;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Chat request as sent by the storefront.
///
/// `messages` is forwarded as-is; the Messages API validates its shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRelayRequest {
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Request body for the Claude Messages API.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<serde_json::Value>,
}

/// Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `model` - Model used when a request does not name one
    /// * `timeout` - Upper bound for each request
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(api_key: &SecretString, model: &str, timeout: Duration) -> Result<Self, ClaudeError> {
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| ClaudeError::Config(format!("Invalid API key format: {e}")))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: model.to_string(),
            }),
        })
    }

    /// Fill in defaults for anything the storefront left out.
    fn messages_request(&self, request: ChatRelayRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.unwrap_or_else(|| self.inner.model.clone()),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            system: request
                .system
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            messages: request.messages,
        }
    }

    /// Forward a chat request and return Anthropic's JSON response verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Anthropic answers with a
    /// non-success status, or the response is not JSON.
    #[instrument(
        skip(self, request),
        fields(messages = request.messages.len(), model = tracing::field::Empty)
    )]
    pub async fn relay(&self, request: ChatRelayRequest) -> Result<serde_json::Value, ClaudeError> {
        let body = self.messages_request(request);
        tracing::Span::current().record("model", body.model.as_str());

        let response = self
            .inner
            .client
            .post(ANTHROPIC_API_URL)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClaudeError::Api { status, body: text });
        }

        serde_json::from_str(&text)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ClaudeClient {
        ClaudeClient::new(
            &SecretString::from("sk-ant-api03-q8Zr5Lw2"),
            "claude-3-sonnet-20240229",
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let request: ChatRelayRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        let body = client().messages_request(request);

        assert_eq!(body.model, "claude-3-sonnet-20240229");
        assert_eq!(body.max_tokens, DEFAULT_MAX_TOKENS);
        assert!((body.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(body.system, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body.messages.len(), 1);
    }

    #[test]
    fn test_request_values_override_defaults() {
        let request: ChatRelayRequest = serde_json::from_str(
            r#"{"messages":[],"system":"Be brief.","model":"claude-x","max_tokens":50,"temperature":0.1}"#,
        )
        .unwrap();
        let body = client().messages_request(request);

        assert_eq!(body.model, "claude-x");
        assert_eq!(body.max_tokens, 50);
        assert_eq!(body.system, "Be brief.");
    }

    #[test]
    fn test_claude_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ClaudeClient>();
    }
}
