//! LLM client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured; the endpoint cannot be used.
    #[error("no LLM API key configured")]
    MissingApiKey,

    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("LLM API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// A 2xx reply that did not contain the expected payload.
    #[error("LLM API returned an empty or malformed response")]
    EmptyResponse,
}
