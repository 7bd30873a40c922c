//! Shared types for provider calls

use super::LlmError;
use serde::Serialize;
use std::time::Duration;

/// Default deadline for a single provider call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal state of one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Succeeded,
    Failed,
}

/// Outcome of one adapter invocation
///
/// Exactly one of `payload` / `error` is set, matching `status`. Fields are
/// private so a result cannot be altered once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCallResult {
    source: String,
    status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
}

impl ProviderCallResult {
    pub fn succeeded(source: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: CallStatus::Succeeded,
            payload: Some(payload.into()),
            error: None,
            duration_ms: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: &LlmError) -> Self {
        Self {
            source: source.into(),
            status: CallStatus::Failed,
            payload: None,
            error: Some(error.to_string()),
            duration_ms: None,
        }
    }

    /// Attach the wall-clock duration of the call
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Succeeded
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }
}

/// Per-call options passed to an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Final synthesis call: provider-specific prompt augmentation
    /// (web-search hints, search tools) is suppressed
    pub synthesis: bool,
    /// Deadline after which the in-flight request is cancelled
    pub deadline: Duration,
}

impl CallOptions {
    /// Options for a first-pass discovery call
    pub fn discovery(deadline: Duration) -> Self {
        Self {
            synthesis: false,
            deadline,
        }
    }

    /// Options for the final synthesis call
    pub fn synthesis(deadline: Duration) -> Self {
        Self {
            synthesis: true,
            deadline,
        }
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::discovery(DEFAULT_CALL_TIMEOUT)
    }
}
