//! Fan-out coordinator - runs every adapter of a request concurrently

use crate::llm::{CallOptions, ProviderAdapter, ProviderCallResult};
use std::sync::Arc;

/// One adapter plus the options it is invoked with
#[derive(Clone)]
pub struct Invocation {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub options: CallOptions,
}

impl Invocation {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, options: CallOptions) -> Self {
        Self { adapter, options }
    }
}

/// A prompt and the ordered invocations to run it through
#[derive(Clone)]
pub struct FanOutRequest {
    pub prompt: String,
    pub invocations: Vec<Invocation>,
}

impl FanOutRequest {
    pub fn new(prompt: impl Into<String>, invocations: Vec<Invocation>) -> Self {
        Self {
            prompt: prompt.into(),
            invocations,
        }
    }
}

pub struct FanOutCoordinator;

impl FanOutCoordinator {
    /// Start all invocations at once and wait for every one to settle
    ///
    /// Results come back in invocation order regardless of completion order.
    /// Adapters never fail past `invoke`, so one slow or broken provider
    /// cannot lose the others' results.
    pub async fn run_all(request: &FanOutRequest) -> Vec<ProviderCallResult> {
        if request.invocations.is_empty() {
            return Vec::new();
        }

        let futures = request
            .invocations
            .iter()
            .map(|inv| inv.adapter.invoke(&request.prompt, &inv.options));
        let results = futures::future::join_all(futures).await;

        for result in &results {
            match result.error() {
                None => tracing::info!(source = %result.source(), "Response received"),
                Some(error) => {
                    tracing::warn!(source = %result.source(), error = %error, "Request failed")
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed {
        name: &'static str,
        delay_ms: u64,
        reply: Result<&'static str, LlmError>,
    }

    #[async_trait]
    impl ProviderAdapter for Fixed {
        fn source(&self) -> &str {
            self.name
        }

        async fn call(&self, _prompt: &str, _options: &CallOptions) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.reply.clone().map(str::to_string)
        }
    }

    fn invocation(
        name: &'static str,
        delay_ms: u64,
        reply: Result<&'static str, LlmError>,
    ) -> Invocation {
        Invocation::new(
            Arc::new(Fixed {
                name,
                delay_ms,
                reply,
            }),
            CallOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_request_yields_no_results() {
        let results = FanOutCoordinator::run_all(&FanOutRequest::new("q", Vec::new())).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_invocation_order() {
        let request = FanOutRequest::new(
            "q",
            vec![
                invocation("slow", 60, Ok("a")),
                invocation("broken", 0, Err(LlmError::http(503, ""))),
                invocation("fast", 5, Ok("c")),
            ],
        );

        let results = FanOutCoordinator::run_all(&request).await;
        let sources: Vec<_> = results.iter().map(|r| r.source()).collect();
        assert_eq!(sources, vec!["slow", "broken", "fast"]);
        assert_eq!(results[0].payload(), Some("a"));
        assert_eq!(results[1].error(), Some("http error 503"));
        assert_eq!(results[2].payload(), Some("c"));
    }

    #[tokio::test]
    async fn test_invocations_run_concurrently() {
        let request = FanOutRequest::new(
            "q",
            (0..4)
                .map(|_| invocation("sleepy", 200, Ok("x")))
                .collect(),
        );

        let started = std::time::Instant::now();
        let results = FanOutCoordinator::run_all(&request).await;
        assert_eq!(results.len(), 4);
        assert!(started.elapsed() < Duration::from_millis(700));
    }
}
