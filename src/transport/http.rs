//! HTTP server exposing one endpoint per deployment

use crate::config::Config;
use crate::llm::ProviderContext;
use crate::orchestration::{Deployment, Outcome, Reply};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;

pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    env!("DEFINITIVE_VERSION_SUFFIX")
);

const PROMPT_REQUIRED: &str = "Prompt is required in the request body.";
const POST_ONLY: &str = "Only POST requests are supported.";

/// Shared application state
pub struct AppState {
    site_name: String,
    deployments: BTreeMap<String, Arc<Deployment>>,
}

impl AppState {
    pub fn new(site_name: impl Into<String>, deployments: Vec<Deployment>) -> Self {
        Self {
            site_name: site_name.into(),
            deployments: deployments
                .into_iter()
                .map(|d| (d.name().to_string(), Arc::new(d)))
                .collect(),
        }
    }

    /// Build every configured deployment over one shared provider context
    pub fn from_config(config: &Config) -> Result<Self> {
        let ctx = ProviderContext::new(config.providers.clone());
        let timeout = Duration::from_secs(config.timeout_secs);
        let deployments = config
            .deployments()
            .iter()
            .map(|d| Deployment::from_config(d, &ctx, timeout))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(&config.providers.site.name, deployments))
    }

    pub fn deployment(&self, name: &str) -> Option<Arc<Deployment>> {
        self.deployments.get(name).cloned()
    }

    pub fn deployment_names(&self) -> Vec<String> {
        self.deployments.keys().cloned().collect()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    deployments: Vec<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .route("/api/:deployment", get(post_only).post(handle_prompt))
        // Also answers OPTIONS on every route with an empty 200
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Run the HTTP server
pub async fn run_http_server(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(
        "HTTP server listening on {} (deployments: {})",
        addr,
        state.deployment_names().join(", ")
    );

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

async fn hello(State(state): State<Arc<AppState>>) -> String {
    format!("Hello {}!", state.site_name)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        deployments: state.deployment_names(),
    })
}

async fn post_only() -> &'static str {
    POST_ONLY
}

async fn handle_prompt(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(deployment) = state.deployment(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Unknown deployment '{}'", name) })),
        )
            .into_response();
    };

    let Some(prompt) = extract_prompt(&headers, &body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": PROMPT_REQUIRED })),
        )
            .into_response();
    };

    let span = tracing::info_span!(
        "request",
        id = %uuid::Uuid::new_v4(),
        deployment = %name
    );
    async move {
        tracing::debug!(prompt_len = prompt.len(), "Handling prompt");
        let outcome = deployment.run(&prompt).await;
        tracing::info!(status = outcome.status, "Request complete");
        render(outcome)
    }
    .instrument(span)
    .await
}

/// Pull the prompt out of a request body
///
/// Accepts a JSON object with a `prompt` string, a bare JSON string, or raw
/// text. Blank prompts are rejected.
pub fn extract_prompt(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let declared_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let prompt = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::to_string),
        Ok(Value::String(s)) => Some(s),
        _ if declared_json => None,
        _ => Some(text.into_owned()),
    };

    prompt.filter(|p| !p.trim().is_empty())
}

fn render(outcome: Outcome) -> Response {
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match outcome.reply {
        Reply::Text(body) => (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Reply::Json(value) => (status, Json(value)).into_response(),
    }
}
