use std::time::Duration;

use thiserror::Error;

/// Failure of the sentiment classifier or entity recognizer on one unit of work.
///
/// Always recovered locally: the affected chunk or text degrades and the
/// request continues.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service could not take the work right now (resource exhaustion,
    /// overload, timeout).
    #[error("inference unavailable: {0}")]
    Unavailable(String),

    /// Non-2xx response that does not indicate a transient condition.
    #[error("inference service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response parsed but does not line up with the request.
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of the ticker lookup service for one name.
///
/// "Not found" is not an error; lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),

    #[error("invalid lookup base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Request-level failures. These abort the whole request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input is empty or structurally invalid; nothing was processed.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Declared group sizes do not cover the flattened results exactly.
    #[error("group sizes sum to {declared} but {actual} results were produced")]
    GroupSizeMismatch { declared: usize, actual: usize },

    /// The request deadline elapsed before every unit finished.
    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}
