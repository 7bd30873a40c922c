//! Deployment pipeline: route, fan out, select, format, wrap

use super::fanout::{FanOutCoordinator, FanOutRequest, Invocation};
use super::formatter;
use super::router::{KeywordRouter, Route};
use super::selector::{Selection, SelectionPolicy};
use crate::config::{DeploymentConfig, Envelope, PolicyConfig, ProviderKind};
use crate::llm::{CallOptions, ProviderAdapter, ProviderContext};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Response body produced by a deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Text(String),
    Json(Value),
}

/// HTTP status plus body; the transport layer only has to render it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub status: u16,
    pub reply: Reply,
}

struct LiveRoute {
    router: KeywordRouter,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

/// One configured handler
pub struct Deployment {
    name: String,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    live: Option<LiveRoute>,
    policy: SelectionPolicy,
    envelope: Envelope,
    annotate_timing: bool,
    deadline: Duration,
    missing_credential: Option<String>,
}

impl Deployment {
    pub fn new(
        name: impl Into<String>,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            adapters,
            live: None,
            policy,
            envelope: Envelope::Plain,
            annotate_timing: false,
            deadline: crate::llm::DEFAULT_CALL_TIMEOUT,
            missing_credential: None,
        }
    }

    /// Prompts matched by `router` use `adapters` instead of the default set
    pub fn with_router(
        mut self,
        router: KeywordRouter,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Self {
        self.live = Some(LiveRoute { router, adapters });
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_timing_annotation(mut self, enabled: bool) -> Self {
        self.annotate_timing = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Refuse every request, naming the unset environment variable
    pub fn with_missing_credential(mut self, env_var: &str) -> Self {
        self.missing_credential = Some(env_var.to_string());
        self
    }

    /// Build a deployment from config using the process-wide adapter factory
    pub fn from_config(
        config: &DeploymentConfig,
        ctx: &ProviderContext,
        default_timeout: Duration,
    ) -> Result<Self> {
        for provider in unkeyed_providers(config, ctx) {
            tracing::warn!(
                deployment = %config.name,
                "{} is not set; {:?} calls will fail",
                provider.env_var(),
                provider
            );
        }

        let adapters = config.adapters.iter().map(|s| ctx.create_adapter(s)).collect();

        let policy = match &config.policy {
            PolicyConfig::FirstSuccess => SelectionPolicy::FirstSuccess,
            PolicyConfig::Synthesis {
                adapter,
                instructions,
            } => SelectionPolicy::synthesis(ctx.create_adapter(adapter), instructions.as_deref()),
        };

        let deadline = config
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);

        let mut deployment = Deployment::new(&config.name, adapters, policy)
            .with_envelope(config.envelope)
            .with_timing_annotation(config.annotate_timing)
            .with_deadline(deadline);

        if let Some(router_config) = &config.router {
            let router = KeywordRouter::new(&router_config.keywords)
                .with_context(|| format!("Invalid keywords for deployment '{}'", config.name))?;
            let live = router_config
                .live_adapters
                .iter()
                .map(|s| ctx.create_adapter(s))
                .collect();
            deployment = deployment.with_router(router, live);
        }

        if let PolicyConfig::Synthesis { adapter, .. } = &config.policy {
            if !ctx.has_credentials(adapter.provider) {
                deployment = deployment.with_missing_credential(adapter.provider.env_var());
            }
        }

        Ok(deployment)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Sources of the adapters a prompt would fan out to
    pub fn sources_for(&self, prompt: &str) -> Vec<&str> {
        self.adapters_for(prompt).iter().map(|a| a.source()).collect()
    }

    fn adapters_for(&self, prompt: &str) -> &[Arc<dyn ProviderAdapter>] {
        match &self.live {
            Some(live) if live.router.route(prompt) == Route::Live => {
                tracing::info!(deployment = %self.name, "Prompt needs live data");
                &live.adapters
            }
            _ => &self.adapters,
        }
    }

    /// Answer one prompt
    pub async fn run(&self, prompt: &str) -> Outcome {
        let started = Instant::now();

        if let Some(env_var) = &self.missing_credential {
            tracing::error!(deployment = %self.name, "{} is not set", env_var);
            return self.failure(json!({ "error": format!("{} is not set.", env_var) }));
        }

        let invocations = self
            .adapters_for(prompt)
            .iter()
            .map(|a| Invocation::new(a.clone(), CallOptions::discovery(self.deadline)))
            .collect();
        let results = FanOutCoordinator::run_all(&FanOutRequest::new(prompt, invocations)).await;

        match self.policy.select(prompt, &results, self.deadline).await {
            Selection::Answer { source, text } => {
                tracing::info!(deployment = %self.name, source = %source, "Answer selected");
                let label = self
                    .annotate_timing
                    .then(|| timing_annotation(started.elapsed()));
                self.success(formatter::format(&text, label.as_deref()))
            }
            Selection::Fallback(message) => self.success(message),
            Selection::Failed { error, details } => {
                tracing::error!(deployment = %self.name, details = %details, "{}", error);
                self.failure(json!({ "error": error, "details": details }))
            }
        }
    }

    fn success(&self, body: String) -> Outcome {
        let reply = match self.envelope {
            Envelope::Plain => Reply::Text(body),
            Envelope::Wrapped => Reply::Json(json!({ "status": 200, "json": body })),
        };
        Outcome { status: 200, reply }
    }

    fn failure(&self, error: Value) -> Outcome {
        let reply = match self.envelope {
            Envelope::Plain => Reply::Json(error),
            Envelope::Wrapped => Reply::Json(json!({ "status": 500, "json": error })),
        };
        Outcome { status: 500, reply }
    }
}

pub fn timing_annotation(elapsed: Duration) -> String {
    format!(
        "<p><small>Response generated in {:.1}s</small></p>",
        elapsed.as_secs_f64()
    )
}

/// Discovery providers (default and live) that have no key, in first-seen order
fn unkeyed_providers(config: &DeploymentConfig, ctx: &ProviderContext) -> Vec<ProviderKind> {
    let live = config.router.iter().flat_map(|r| r.live_adapters.iter());
    let mut missing = Vec::new();
    for spec in config.adapters.iter().chain(live) {
        if !ctx.has_credentials(spec.provider) && !missing.contains(&spec.provider) {
            missing.push(spec.provider);
        }
    }
    missing
}
