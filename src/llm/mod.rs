//! LLM provider adapters
//!
//! Each adapter turns a prompt into one provider-specific HTTP call and
//! normalizes the reply into a [`ProviderCallResult`]. Adapters never return
//! an error past [`ProviderAdapter::invoke`]: every failure becomes a
//! `failed` result.

mod credentials;
mod error;
mod gemini;
mod openai_compat;
mod openrouter;
mod perplexity;
mod transport;
mod types;

pub use credentials::{CredentialPool, CredentialSelector, RoundRobin};
pub use error::LlmError;
pub use gemini::{GeminiAdapter, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE};
pub use openai_compat::{OpenAiCompatAdapter, OpenAiCompatConfig};
pub use openrouter::{
    OpenRouterAdapter, DEFAULT_OPENROUTER_MODEL, OPENROUTER_API_URL, WEB_SEARCH_SUFFIX,
};
pub use perplexity::{PerplexityAdapter, DEFAULT_PERPLEXITY_MODEL, PERPLEXITY_API_URL};
pub use transport::{HttpTransport, InboundResponse, OutboundRequest, ReqwestTransport};
pub use types::*;

#[cfg(test)]
pub(crate) use transport::mock;

use crate::config::{AdapterSpec, ProviderKind, ProvidersConfig};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// One external LLM service behind a common call shape
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Identifier reported as the result `source`
    fn source(&self) -> &str;

    /// Perform one attempt against the provider
    ///
    /// Must return `LlmError::MissingCredential` without touching the
    /// network when no credential is configured.
    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError>;

    /// Run [`call`](Self::call) under `options.deadline` and capture the outcome
    ///
    /// On timeout the in-flight call future is dropped, which aborts the
    /// underlying request.
    async fn invoke(&self, prompt: &str, options: &CallOptions) -> ProviderCallResult {
        let source = self.source().to_string();
        let started = Instant::now();
        tracing::debug!(
            target: "llm",
            source = %source,
            synthesis = options.synthesis,
            deadline_ms = options.deadline.as_millis() as u64,
            "Starting provider call"
        );

        let outcome = match tokio::time::timeout(options.deadline, self.call(prompt, options)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(LlmError::Timeout),
        };
        let elapsed = started.elapsed();

        let result = match outcome {
            Ok(payload) => {
                tracing::info!(
                    target: "llm",
                    source = %source,
                    duration_ms = elapsed.as_millis() as u64,
                    "Provider call succeeded"
                );
                ProviderCallResult::succeeded(source, payload)
            }
            Err(e) => {
                tracing::warn!(
                    target: "llm",
                    source = %source,
                    duration_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "Provider call failed"
                );
                ProviderCallResult::failed(source, &e)
            }
        };

        result.with_duration(elapsed)
    }
}

/// Check the status and decode a provider JSON envelope
///
/// The raw body of an undecodable 2xx reply is logged, never returned.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    source: &str,
    response: &InboundResponse,
) -> Result<T, LlmError> {
    if !response.is_success() {
        return Err(LlmError::http(response.status, &response.body));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!(
            target: "llm",
            source = %source,
            raw = %response.body,
            "Failed to parse provider response: {}",
            e
        );
        LlmError::MalformedResponse
    })
}

/// Process-scoped factory for adapters
///
/// Owns the shared transport and the credential selector; created once at
/// startup and never reset.
pub struct ProviderContext {
    transport: Arc<dyn HttpTransport>,
    selector: Arc<dyn CredentialSelector>,
    providers: ProvidersConfig,
}

impl ProviderContext {
    /// Production context: reqwest transport and a fresh round-robin counter
    pub fn new(providers: ProvidersConfig) -> Self {
        Self::with_transport(
            providers,
            Arc::new(ReqwestTransport::new()),
            Arc::new(RoundRobin::new()),
        )
    }

    pub fn with_transport(
        providers: ProvidersConfig,
        transport: Arc<dyn HttpTransport>,
        selector: Arc<dyn CredentialSelector>,
    ) -> Self {
        Self {
            transport,
            selector,
            providers,
        }
    }

    /// Credential pool for a provider, sharing the process-wide selector
    pub fn credentials(&self, kind: ProviderKind) -> CredentialPool {
        CredentialPool::new(
            self.providers.keys(kind).api_keys.clone(),
            self.selector.clone(),
        )
    }

    pub fn has_credentials(&self, kind: ProviderKind) -> bool {
        !self.credentials(kind).is_empty()
    }

    /// Build the adapter described by `spec`
    pub fn create_adapter(&self, spec: &AdapterSpec) -> Arc<dyn ProviderAdapter> {
        let keys = self.providers.keys(spec.provider);
        let credentials = self.credentials(spec.provider);
        let transport = self.transport.clone();

        match spec.provider {
            ProviderKind::Gemini => {
                let mut adapter = GeminiAdapter::new(transport, credentials)
                    .with_model(spec.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL));
                if let Some(base_url) = &keys.base_url {
                    adapter = adapter.with_base_url(base_url);
                }
                if let Some(label) = &spec.label {
                    adapter = adapter.with_source(label);
                }
                Arc::new(adapter)
            }
            ProviderKind::Perplexity => Arc::new(PerplexityAdapter::new(
                transport,
                credentials,
                spec.model.as_deref().unwrap_or(DEFAULT_PERPLEXITY_MODEL),
                keys.base_url.as_deref().unwrap_or(PERPLEXITY_API_URL),
                spec.label.as_deref().unwrap_or("Perplexity"),
            )),
            ProviderKind::OpenRouter => Arc::new(OpenRouterAdapter::with_endpoint(
                transport,
                credentials,
                spec.model.as_deref().unwrap_or(DEFAULT_OPENROUTER_MODEL),
                &self.providers.site,
                keys.base_url.as_deref().unwrap_or(OPENROUTER_API_URL),
                spec.label.as_deref(),
            )),
        }
    }
}
