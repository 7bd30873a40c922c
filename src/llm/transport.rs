//! Outbound HTTP seam used by every adapter
//!
//! Adapters build an [`OutboundRequest`] and hand it to an [`HttpTransport`].
//! Production uses [`ReqwestTransport`]; tests swap in a mock that counts
//! calls and observes cancellation.

use super::LlmError;
use async_trait::async_trait;

/// A JSON `POST` to a provider endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl OutboundRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw provider reply: status code plus undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundResponse {
    pub status: u16,
    pub body: String,
}

impl InboundResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Dropping the returned future must abort the request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: OutboundRequest) -> Result<InboundResponse, LlmError>;
}

/// reqwest-backed transport; dropping an in-flight future closes its connection
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: OutboundRequest) -> Result<InboundResponse, LlmError> {
        let mut req = self
            .client
            .post(&request.url)
            .header("Content-Type", "application/json");

        for (name, value) in &request.headers {
            req = req.header(name, value);
        }

        let response = req
            .json(&request.body)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(LlmError::from_network_error)?;

        Ok(InboundResponse { status, body })
    }
}
