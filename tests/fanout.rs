//! Fan-out coordinator behaviour against scripted adapters

mod common;

use common::{dynamic, ScriptedAdapter};
use definitive_ai::llm::{CallOptions, CallStatus, LlmError};
use definitive_ai::orchestration::{FanOutCoordinator, FanOutRequest, Invocation};
use std::time::{Duration, Instant};

fn invocation(adapter: &std::sync::Arc<ScriptedAdapter>, deadline: Duration) -> Invocation {
    Invocation::new(dynamic(adapter), CallOptions::discovery(deadline))
}

#[tokio::test]
async fn test_slow_provider_times_out_without_blocking_others() {
    let fast = ScriptedAdapter::ok("fast", "quick answer").shared();
    let slow = ScriptedAdapter::ok("slow", "too late")
        .delayed(Duration::from_secs(10))
        .shared();
    let deadline = Duration::from_millis(100);

    let request = FanOutRequest::new(
        "question",
        vec![invocation(&slow, deadline), invocation(&fast, deadline)],
    );

    let started = Instant::now();
    let results = FanOutCoordinator::run_all(&request).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(results[0].source(), "slow");
    assert_eq!(results[0].error(), Some("timeout"));
    assert_eq!(results[1].payload(), Some("quick answer"));
}

#[tokio::test]
async fn test_all_failures_still_return_every_result() {
    let a = ScriptedAdapter::failing("a", LlmError::MissingCredential).shared();
    let b = ScriptedAdapter::failing("b", LlmError::MalformedResponse).shared();
    let c = ScriptedAdapter::failing("c", LlmError::Network("reset".into())).shared();
    let deadline = Duration::from_secs(5);

    let request = FanOutRequest::new(
        "q",
        vec![
            invocation(&a, deadline),
            invocation(&b, deadline),
            invocation(&c, deadline),
        ],
    );
    let results = FanOutCoordinator::run_all(&request).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status() == CallStatus::Failed));
    assert_eq!(results[0].error(), Some("missing credential"));
    assert_eq!(results[1].error(), Some("malformed response"));
    assert_eq!(results[2].error(), Some("network error: reset"));
}

#[tokio::test]
async fn test_every_adapter_receives_the_prompt_once() {
    let a = ScriptedAdapter::ok("a", "1").shared();
    let b = ScriptedAdapter::ok("b", "2").shared();
    let deadline = Duration::from_secs(5);

    let request = FanOutRequest::new(
        "What's new in Rust?",
        vec![invocation(&a, deadline), invocation(&b, deadline)],
    );
    FanOutCoordinator::run_all(&request).await;

    for adapter in [&a, &b] {
        assert_eq!(adapter.calls(), 1);
        let (prompt, options) = &adapter.prompts()[0];
        assert_eq!(prompt, "What's new in Rust?");
        assert!(!options.synthesis);
    }
}

#[tokio::test]
async fn test_results_record_durations() {
    let a = ScriptedAdapter::ok("a", "x")
        .delayed(Duration::from_millis(20))
        .shared();
    let request = FanOutRequest::new("q", vec![invocation(&a, Duration::from_secs(5))]);

    let results = FanOutCoordinator::run_all(&request).await;
    assert!(results[0].duration_ms().unwrap() >= 20);
}
