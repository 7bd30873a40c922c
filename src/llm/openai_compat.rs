//! Generic OpenAI-compatible chat-completions adapter
//!
//! Shared by every provider that speaks the `/chat/completions` format
//! (OpenRouter, Perplexity). The provider-specific modules only supply the
//! endpoint, headers, and prompt augmentation.
//!
//! SECURITY: Credentials are only sent to the configured endpoint.

use super::{
    decode_envelope, CallOptions, CredentialPool, HttpTransport, LlmError, OutboundRequest,
    ProviderAdapter,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Configuration Types
// ============================================================================

/// Static description of an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Provider name used in logs (e.g. "openrouter")
    pub name: String,
    /// Full chat completions URL
    pub base_url: String,
    pub model: String,
    /// Label reported as the result source; defaults to the model id
    pub source: Option<String>,
    /// Extra headers sent with every request
    pub custom_headers: Vec<(String, String)>,
    /// Appended to the prompt on discovery calls only
    pub discovery_suffix: Option<String>,
}

impl OpenAiCompatConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            model: String::new(),
            source: None,
            custom_headers: Vec::new(),
            discovery_suffix: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_discovery_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.discovery_suffix = Some(suffix.into());
        self
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

pub struct OpenAiCompatAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: CredentialPool,
    config: OpenAiCompatConfig,
    source: String,
}

impl OpenAiCompatAdapter {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialPool,
        config: OpenAiCompatConfig,
    ) -> Self {
        let source = config.source.clone().unwrap_or_else(|| config.model.clone());
        Self {
            transport,
            credentials,
            config,
            source,
        }
    }

    /// Prompt text actually sent, after augmentation
    fn prompt_for(&self, prompt: &str, options: &CallOptions) -> String {
        match (&self.config.discovery_suffix, options.synthesis) {
            (Some(suffix), false) => format!("{}{}", prompt, suffix),
            _ => prompt.to_string(),
        }
    }

    fn build_http_request(&self, api_key: &str, body: serde_json::Value) -> OutboundRequest {
        let mut request = OutboundRequest::new(self.config.base_url.clone(), body)
            .with_header("Authorization", format!("Bearer {}", api_key));

        for (name, value) in &self.config.custom_headers {
            request = request.with_header(name.clone(), value.clone());
        }

        request
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    fn source(&self) -> &str {
        &self.source
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        let api_key = self.credentials.pick().ok_or(LlmError::MissingCredential)?;

        let body = OpenAiRequest {
            model: &self.config.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: self.prompt_for(prompt, options),
            }],
        };
        let body = serde_json::to_value(&body)
            .map_err(|e| LlmError::Network(format!("failed to encode request: {}", e)))?;

        tracing::debug!(
            target: "llm",
            provider = %self.config.name,
            model = %self.config.model,
            synthesis = options.synthesis,
            "Sending chat completion request"
        );

        let response = self
            .transport
            .post_json(self.build_http_request(api_key, body))
            .await?;
        let envelope: OpenAiResponse = decode_envelope(&self.source, &response)?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!(
                    target: "llm",
                    source = %self.source,
                    raw = %response.body,
                    "Chat completion has no message content"
                );
                LlmError::MalformedResponse
            })
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockTransport;
    use crate::llm::RoundRobin;
    use std::time::Duration;

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "gen-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}
        })
    }

    fn adapter(transport: Arc<MockTransport>, keys: &[&str]) -> OpenAiCompatAdapter {
        let credentials = CredentialPool::new(
            keys.iter().map(|k| k.to_string()).collect(),
            Arc::new(RoundRobin::new()),
        );
        OpenAiCompatAdapter::new(
            transport,
            credentials,
            OpenAiCompatConfig::new("test", "http://127.0.0.1:1/v1/chat/completions")
                .with_model("vendor/model-a")
                .with_header("X-Title", "Definitive AI")
                .with_discovery_suffix(". Use web search"),
        )
    }

    #[tokio::test]
    async fn test_discovery_call_appends_suffix() {
        let transport = Arc::new(MockTransport::json(completion("answer")));
        let adapter = adapter(transport.clone(), &["k1"]);

        let result = adapter.invoke("What is Rust", &CallOptions::default()).await;
        assert_eq!(result.payload(), Some("answer"));
        assert_eq!(result.source(), "vendor/model-a");

        let request = transport.last_request().unwrap();
        assert_eq!(request.body["model"], "vendor/model-a");
        assert_eq!(
            request.body["messages"][0]["content"],
            "What is Rust. Use web search"
        );
        assert_eq!(request.header("authorization"), Some("Bearer k1"));
        assert_eq!(request.header("x-title"), Some("Definitive AI"));
    }

    #[tokio::test]
    async fn test_synthesis_call_sends_prompt_verbatim() {
        let transport = Arc::new(MockTransport::json(completion("combined")));
        let adapter = adapter(transport.clone(), &["k1"]);

        let options = CallOptions::synthesis(Duration::from_secs(5));
        adapter.invoke("Summarize", &options).await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.body["messages"][0]["content"], "Summarize");
    }

    #[tokio::test]
    async fn test_source_label_overrides_model() {
        let transport = Arc::new(MockTransport::json(completion("ok")));
        let credentials = CredentialPool::new(vec!["secret".into()], Arc::new(RoundRobin::new()));
        let adapter = OpenAiCompatAdapter::new(
            transport.clone(),
            credentials,
            OpenAiCompatConfig::new("custom", "http://127.0.0.1:1/chat")
                .with_model("m")
                .with_source("Custom"),
        );

        let result = adapter.invoke("q", &CallOptions::default()).await;
        assert_eq!(result.source(), "Custom");
        let request = transport.last_request().unwrap();
        assert_eq!(request.body["model"], "m");
        assert_eq!(request.header("authorization"), Some("Bearer secret"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let transport = Arc::new(MockTransport::json(serde_json::json!({"choices": []})));
        let result = adapter(transport, &["k1"])
            .invoke("q", &CallOptions::default())
            .await;
        assert_eq!(result.error(), Some("malformed response"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let transport = Arc::new(MockTransport::reply(200, "<html>gateway</html>"));
        let result = adapter(transport, &["k1"])
            .invoke("q", &CallOptions::default())
            .await;
        assert_eq!(result.error(), Some("malformed response"));
    }

    #[tokio::test]
    async fn test_http_error_includes_body() {
        let transport = Arc::new(MockTransport::reply(
            429,
            r#"{"error":{"message":"Rate limit exceeded"}}"#,
        ));
        let result = adapter(transport, &["k1"])
            .invoke("q", &CallOptions::default())
            .await;
        assert_eq!(
            result.error(),
            Some(r#"http error 429: {"error":{"message":"Rate limit exceeded"}}"#)
        );
    }

    #[tokio::test]
    async fn test_network_error_is_captured() {
        let transport = Arc::new(MockTransport::failing(LlmError::Network(
            "connection reset".into(),
        )));
        let result = adapter(transport, &["k1"])
            .invoke("q", &CallOptions::default())
            .await;
        assert_eq!(result.error(), Some("network error: connection reset"));
        assert!(result.duration_ms().is_some());
    }

    #[tokio::test]
    async fn test_keys_rotate_between_calls() {
        let transport = Arc::new(MockTransport::json(completion("ok")));
        let adapter = adapter(transport.clone(), &["k1", "k2"]);

        adapter.invoke("q", &CallOptions::default()).await;
        assert_eq!(
            transport.last_request().unwrap().header("authorization"),
            Some("Bearer k1")
        );
        adapter.invoke("q", &CallOptions::default()).await;
        assert_eq!(
            transport.last_request().unwrap().header("authorization"),
            Some("Bearer k2")
        );
    }
}
