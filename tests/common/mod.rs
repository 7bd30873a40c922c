//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use definitive_ai::llm::{
    CallOptions, HttpTransport, InboundResponse, LlmError, OutboundRequest, ProviderAdapter,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Adapter that replies from a script instead of the network
pub struct ScriptedAdapter {
    source: String,
    reply: Result<String, LlmError>,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, CallOptions)>>,
}

impl ScriptedAdapter {
    pub fn ok(source: &str, reply: &str) -> Self {
        Self::with_reply(source, Ok(reply.to_string()))
    }

    pub fn failing(source: &str, error: LlmError) -> Self {
        Self::with_reply(source, Err(error))
    }

    fn with_reply(source: &str, reply: Result<String, LlmError>) -> Self {
        Self {
            source: source.to_string(),
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, with the options each call was made with
    pub fn prompts(&self) -> Vec<(String, CallOptions)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn source(&self) -> &str {
        &self.source
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), *options));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

/// Upcast helper for building adapter lists
pub fn dynamic(adapter: &Arc<ScriptedAdapter>) -> Arc<dyn ProviderAdapter> {
    adapter.clone()
}

/// Transport that answers every request with an OpenAI-style completion
/// whose content echoes the requested model
pub struct EchoTransport {
    requests: Mutex<Vec<OutboundRequest>>,
}

impl EchoTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for EchoTransport {
    async fn post_json(&self, request: OutboundRequest) -> Result<InboundResponse, LlmError> {
        let model = request.body["model"].as_str().unwrap_or("gemini").to_string();
        self.requests.lock().unwrap().push(request);
        let body = serde_json::json!({
            "choices": [{"message": {"content": format!("answer from {}", model)}}]
        });
        Ok(InboundResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}
