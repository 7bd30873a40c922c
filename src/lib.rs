//! definitive: one prompt, many LLMs, one answer
//!
//! This library provides:
//! - Provider adapters for Gemini, Perplexity and OpenRouter with key rotation
//! - A fan-out coordinator that runs every adapter concurrently under a deadline
//! - Selection policies (first success, synthesis) and response formatting
//! - An HTTP server exposing each configured deployment

pub mod config;
pub mod llm;
pub mod orchestration;
pub mod transport;

pub use config::Config;
pub use orchestration::{Deployment, Outcome, Reply};
