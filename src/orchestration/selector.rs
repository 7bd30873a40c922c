//! Result selection policies
//!
//! A policy turns the ordered fan-out results into exactly one answer:
//! either the first success, or a synthesis call that folds every success
//! into a single definitive response.

use crate::llm::{CallOptions, ProviderAdapter, ProviderCallResult};
use std::sync::Arc;
use std::time::Duration;

/// Returned with a 200 when a first-success deployment has nothing to show
pub const FALLBACK_MESSAGE: &str =
    "Unable to generate answer from this source. Please try again later.";

pub const SYNTHESIS_FAILED: &str = "Failed to generate final summary.";

pub const DEFAULT_SYNTHESIS_INSTRUCTIONS: &str =
    "Generate one definitive answer strictly on the basis of these sources, in html format.";

const SOURCE_SEPARATOR: &str = "----------------------";

/// What a policy decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A provider answer that should be formatted and returned
    Answer { source: String, text: String },
    /// Nothing succeeded, but the deployment degrades gracefully
    Fallback(String),
    /// Nothing usable; surfaced as an error response
    Failed { error: String, details: String },
}

/// The final synthesis step of a synthesis policy
#[derive(Clone)]
pub struct SynthesisStep {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub instructions: String,
}

#[derive(Clone)]
pub enum SelectionPolicy {
    FirstSuccess,
    Synthesis(SynthesisStep),
}

impl SelectionPolicy {
    pub fn synthesis(adapter: Arc<dyn ProviderAdapter>, instructions: Option<&str>) -> Self {
        SelectionPolicy::Synthesis(SynthesisStep {
            adapter,
            instructions: instructions
                .unwrap_or(DEFAULT_SYNTHESIS_INSTRUCTIONS)
                .to_string(),
        })
    }

    pub async fn select(
        &self,
        prompt: &str,
        results: &[ProviderCallResult],
        deadline: Duration,
    ) -> Selection {
        match self {
            SelectionPolicy::FirstSuccess => select_first_success(results),
            SelectionPolicy::Synthesis(step) => synthesize(prompt, results, step, deadline).await,
        }
    }
}

/// Earliest success in invocation order, not completion order
pub fn select_first_success(results: &[ProviderCallResult]) -> Selection {
    results
        .iter()
        .find_map(|r| {
            r.payload().map(|text| Selection::Answer {
                source: r.source().to_string(),
                text: text.to_string(),
            })
        })
        .unwrap_or_else(|| Selection::Fallback(FALLBACK_MESSAGE.to_string()))
}

/// Fold successful payloads into one synthesis prompt
///
/// Sources are numbered 1..N in result order; provider names are not
/// included so the synthesizer weighs content, not brand.
pub fn build_synthesis_prompt(
    prompt: &str,
    sources: &[&ProviderCallResult],
    instructions: &str,
) -> String {
    let question = prompt.trim_end();
    let mut out = String::new();
    out.push_str(question);
    if !question.ends_with(['.', '?', '!']) {
        out.push('.');
    }
    out.push_str(&format!(
        "\nTo answer this query you have {} sources.\n",
        sources.len()
    ));

    for (i, result) in sources.iter().enumerate() {
        out.push_str(&format!(
            "### Source {}\n{}\n{}\n",
            i + 1,
            result.payload().unwrap_or_default(),
            SOURCE_SEPARATOR
        ));
    }

    out.push_str("Use only the information in these sources.\n");
    out.push_str(instructions);
    out
}

/// Run the synthesis step over every successful result
///
/// Zero successes fails without calling the synthesis adapter.
pub async fn synthesize(
    prompt: &str,
    results: &[ProviderCallResult],
    step: &SynthesisStep,
    deadline: Duration,
) -> Selection {
    let successes: Vec<&ProviderCallResult> = results.iter().filter(|r| r.is_success()).collect();
    if successes.is_empty() {
        tracing::error!("No provider returned a result; skipping synthesis");
        return Selection::Failed {
            error: SYNTHESIS_FAILED.to_string(),
            details: "No provider returned a result.".to_string(),
        };
    }

    tracing::info!(
        sources = successes.len(),
        synthesizer = %step.adapter.source(),
        "Synthesizing final answer"
    );
    let synthesis_prompt = build_synthesis_prompt(prompt, &successes, &step.instructions);
    let result = step
        .adapter
        .invoke(&synthesis_prompt, &CallOptions::synthesis(deadline))
        .await;

    match (result.payload(), result.error()) {
        (Some(text), _) => Selection::Answer {
            source: result.source().to_string(),
            text: text.to_string(),
        },
        (None, error) => Selection::Failed {
            error: SYNTHESIS_FAILED.to_string(),
            details: error.unwrap_or("unknown error").to_string(),
        },
    }
}
