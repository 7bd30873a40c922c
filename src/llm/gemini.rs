//! Google Gemini adapter
//!
//! SECURITY: API keys are ONLY sent to the configured Gemini endpoint, in the
//! `x-goog-api-key` header rather than the query string.

use super::{
    decode_envelope, CallOptions, CredentialPool, HttpTransport, LlmError, OutboundRequest,
    ProviderAdapter,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Official Google Gemini API endpoint
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: CredentialPool,
    base_url: String,
    model: String,
    source: String,
    google_search: bool,
}

impl GeminiAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: CredentialPool) -> Self {
        Self {
            transport,
            credentials,
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            source: "Gemini".to_string(),
            google_search: true,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Attach the `google_search` grounding tool to discovery calls
    pub fn with_google_search(mut self, enabled: bool) -> Self {
        self.google_search = enabled;
        self
    }

    fn build_request(&self, prompt: &str, options: &CallOptions) -> GeminiRequest {
        let tools = if self.google_search && !options.synthesis {
            Some(vec![GeminiTool {
                google_search: serde_json::json!({}),
            }])
        } else {
            None
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            tools,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn source(&self) -> &str {
        &self.source
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        let api_key = self.credentials.pick().ok_or(LlmError::MissingCredential)?;

        let body = serde_json::to_value(self.build_request(prompt, options))
            .map_err(|e| LlmError::Network(format!("failed to encode request: {}", e)))?;
        let request = OutboundRequest::new(
            format!("{}/{}:generateContent", self.base_url, self.model),
            body,
        )
        .with_header("x-goog-api-key", api_key);

        let response = self.transport.post_json(request).await?;
        let envelope: GeminiResponse = decode_envelope(&self.source, &response)?;

        // First candidate's first text part
        envelope
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.text.clone()))
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!(
                    target: "llm",
                    source = %self.source,
                    raw = %response.body,
                    "Gemini response has no candidate text"
                );
                LlmError::MalformedResponse
            })
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize)]
struct GeminiTool {
    google_search: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}
