//! Typed errors for provider calls
//!
//! Every failure an adapter can hit is folded into one of these variants at
//! the adapter boundary. The `Display` strings double as the `error` field of
//! a failed [`ProviderCallResult`](super::ProviderCallResult), so they are
//! kept short and stable.

use thiserror::Error;

/// Longest provider error body carried into an error message
const MAX_ERROR_BODY: usize = 500;

/// Failure modes of a single provider call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// No credential configured for the provider; no request was sent
    #[error("missing credential")]
    MissingCredential,

    /// The call did not finish before its deadline and was cancelled
    #[error("timeout")]
    Timeout,

    /// The provider answered with a non-2xx status
    #[error("http error {status}{}", body_suffix(.body))]
    Http { status: u16, body: Option<String> },

    /// 2xx response without the expected envelope fields
    #[error("malformed response")]
    MalformedResponse,

    /// Transport-level failure (DNS, connection reset, TLS, ...)
    #[error("network error: {0}")]
    Network(String),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(": {}", body),
        None => String::new(),
    }
}

impl LlmError {
    /// Convert an HTTP status code and response body into an `Http` error
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        Self::http(status.as_u16(), &error_text)
    }

    /// Build an `Http` error from a raw status code, truncating long bodies
    pub fn http(status: u16, error_text: &str) -> Self {
        let body = error_text.trim();
        let body = if body.is_empty() {
            None
        } else if body.chars().count() > MAX_ERROR_BODY {
            Some(format!(
                "{}...",
                body.chars().take(MAX_ERROR_BODY).collect::<String>()
            ))
        } else {
            Some(body.to_string())
        };

        LlmError::Http { status, body }
    }

    /// Convert network/connection errors from reqwest
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else if e.is_connect() {
            LlmError::Network(format!("connection failed: {}", e))
        } else {
            LlmError::Network(e.to_string())
        }
    }
}
