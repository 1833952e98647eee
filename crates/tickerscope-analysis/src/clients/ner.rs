//! Entity recognizer backed by an HTTP entity server (spaCy-style labels).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_http_client, endpoint, inference_status_error, inference_transport_error};
use crate::capability::EntityRecognizer;
use crate::error::InferenceError;
use crate::types::{EntityKind, EntitySpan};

/// Client for `POST {base}/ents` taking `{"texts": [..]}` and answering with
/// one `[{"text", "label"}]` list per input text.
pub struct NerClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct EntsRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Ent {
    text: String,
    label: String,
}

impl NerClient {
    /// # Errors
    ///
    /// Returns [`InferenceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, InferenceError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            url: endpoint(base_url, "ents"),
        })
    }
}

#[async_trait]
impl EntityRecognizer for NerClient {
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, InferenceError> {
        let mut batch = self.extract_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| InferenceError::MalformedResponse("no entity list returned".to_string()))
    }

    async fn extract_batch(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>, InferenceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&EntsRequest { texts })
            .send()
            .await
            .map_err(inference_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(inference_status_error(status, body));
        }

        let docs: Vec<Vec<Ent>> = response.json().await.map_err(|e| {
            InferenceError::MalformedResponse(format!("entity server response: {e}"))
        })?;
        if docs.len() != texts.len() {
            return Err(InferenceError::MalformedResponse(format!(
                "entity server returned {} documents for {} texts",
                docs.len(),
                texts.len()
            )));
        }

        Ok(docs
            .into_iter()
            .map(|ents| {
                ents.into_iter()
                    .map(|e| EntitySpan::new(e.text, EntityKind::from_label(&e.label)))
                    .collect()
            })
            .collect())
    }
}
