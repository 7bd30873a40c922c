//! Transport layer for CLI and HTTP communication

pub mod cli;
pub mod http;

pub use http::{run_http_server, AppState};
