//! Perplexity adapter
//!
//! Perplexity's `sonar` models search the web on their own, so prompts are
//! never augmented.

use super::{
    openai_compat::{OpenAiCompatAdapter, OpenAiCompatConfig},
    CallOptions, CredentialPool, HttpTransport, LlmError, ProviderAdapter,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Official Perplexity API endpoint
pub const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";

pub struct PerplexityAdapter {
    inner: OpenAiCompatAdapter,
}

impl PerplexityAdapter {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialPool,
        model: &str,
        url: &str,
        source: &str,
    ) -> Self {
        let config = OpenAiCompatConfig::new("perplexity", url)
            .with_model(model)
            .with_source(source);

        Self {
            inner: OpenAiCompatAdapter::new(transport, credentials, config),
        }
    }
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    fn source(&self) -> &str {
        self.inner.source()
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        self.inner.call(prompt, options).await
    }
}
