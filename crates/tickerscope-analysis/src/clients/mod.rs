//! HTTP-backed implementations of the capability traits.

mod ner;
mod tei;
mod yahoo;

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::InferenceError;

pub use ner::NerClient;
pub use tei::TeiClassifier;
pub use yahoo::YahooSymbolLookup;

/// Builds the shared `reqwest` client used by every capability client.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
}

/// Trims a base URL so endpoint paths can be appended with a single slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Maps a transport error from an inference call.
///
/// Timeouts and refused connections mean the service cannot take the work
/// right now, which the pipeline treats like resource exhaustion.
pub(crate) fn inference_transport_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() || e.is_connect() {
        InferenceError::Unavailable(e.to_string())
    } else {
        InferenceError::Http(e)
    }
}

/// Maps a non-2xx inference response.
pub(crate) fn inference_status_error(status: StatusCode, body: String) -> InferenceError {
    if status.is_server_error()
        || status == StatusCode::PAYLOAD_TOO_LARGE
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        InferenceError::Unavailable(format!("status {status}: {body}"))
    } else {
        InferenceError::Status {
            status: status.as_u16(),
            body,
        }
    }
}
