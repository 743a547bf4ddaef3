//! AI insights for care portal patients.
//!
//! Two independent paths:
//! - **Generative summaries**: recent vitals and breath readings are rendered
//!   as text, sent through a [`TextCompletion`] backend twice (summary, then
//!   risk assessment) and cached per patient until newer readings arrive.
//! - **Disease probabilities**: a single reading is posted to the local
//!   prediction service via [`MlClient`].

pub mod completion;
pub mod format;
pub mod ml;
pub mod prompts;
pub mod service;

pub use completion::*;
pub use format::format_health_data;
pub use ml::*;
pub use prompts::*;
pub use service::*;

use thiserror::Error;

/// Insight errors.
#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Database error: {0}")]
    Database(#[from] care_portal_core::db::DbError),

    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),

    #[error("Cannot connect to {0}")]
    Connection(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),

    #[error("Completion failed: {0}")]
    Completion(String),
}

pub type InsightsResult<T> = Result<T, InsightsError>;

/// Map a transport error from reqwest onto [`InsightsError`].
pub(crate) fn transport_error(e: reqwest::Error, url: &str, timeout_ms: u64) -> InsightsError {
    if e.is_timeout() {
        InsightsError::Timeout(timeout_ms)
    } else if e.is_connect() {
        InsightsError::Connection(url.to_string())
    } else {
        InsightsError::HttpClient(e.to_string())
    }
}
