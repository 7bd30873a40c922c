//! OpenRouter adapter
//!
//! OpenRouter provides access to many models through an OpenAI-compatible
//! API. Discovery calls ask the model to use web search; synthesis calls
//! send the prompt untouched.
//!
//! SECURITY: API keys are ONLY sent to the configured OpenRouter endpoint.

use super::{
    openai_compat::{OpenAiCompatAdapter, OpenAiCompatConfig},
    CallOptions, CredentialPool, HttpTransport, LlmError, ProviderAdapter,
};
use crate::config::SiteConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Official OpenRouter API endpoint
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-oss-20b:free";

/// Appended to discovery prompts
pub const WEB_SEARCH_SUFFIX: &str = ". Use web search to generate more accurate result";

/// OpenRouter adapter using the common OpenAI-compatible layer
pub struct OpenRouterAdapter {
    inner: OpenAiCompatAdapter,
}

impl OpenRouterAdapter {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialPool,
        model: &str,
        site: &SiteConfig,
    ) -> Self {
        Self::with_endpoint(transport, credentials, model, site, OPENROUTER_API_URL, None)
    }

    pub fn with_endpoint(
        transport: Arc<dyn HttpTransport>,
        credentials: CredentialPool,
        model: &str,
        site: &SiteConfig,
        url: &str,
        source: Option<&str>,
    ) -> Self {
        let mut config = OpenAiCompatConfig::new("openrouter", url)
            .with_model(model)
            .with_header("HTTP-Referer", site.url.as_str())
            .with_header("X-Title", site.name.as_str())
            .with_discovery_suffix(WEB_SEARCH_SUFFIX);
        if let Some(source) = source {
            config = config.with_source(source);
        }

        Self {
            inner: OpenAiCompatAdapter::new(transport, credentials, config),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn source(&self) -> &str {
        self.inner.source()
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        self.inner.call(prompt, options).await
    }
}
