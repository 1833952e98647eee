//! Sentiment classifier backed by a Text Embeddings Inference `/predict` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{build_http_client, endpoint, inference_status_error, inference_transport_error};
use crate::capability::SentimentClassifier;
use crate::error::InferenceError;
use crate::types::{Classification, SentimentLabel};

/// TEI HTTP client serving a sequence-classification model (e.g. FinBERT tone).
pub struct TeiClassifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

impl TeiClassifier {
    /// # Errors
    ///
    /// Returns [`InferenceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, InferenceError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            url: endpoint(base_url, "predict"),
        })
    }

    async fn predict(&self, texts: &[String]) -> Result<Vec<Vec<Prediction>>, InferenceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PredictRequest { inputs: texts })
            .send()
            .await
            .map_err(inference_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(inference_status_error(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| InferenceError::MalformedResponse(format!("TEI predict response: {e}")))
    }
}

/// Picks the highest-scoring label of one prediction list.
fn top_label(predictions: Vec<Prediction>) -> Result<Classification, InferenceError> {
    predictions
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|p| Classification::new(SentimentLabel::parse(&p.label), p.score))
        .ok_or_else(|| InferenceError::MalformedResponse("empty prediction list".to_string()))
}

#[async_trait]
impl SentimentClassifier for TeiClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, InferenceError> {
        let mut batch = self.classify_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| InferenceError::MalformedResponse("no prediction returned".to_string()))
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>, InferenceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let predictions = self.predict(texts).await?;
        if predictions.len() != texts.len() {
            return Err(InferenceError::MalformedResponse(format!(
                "TEI returned {} predictions for {} inputs",
                predictions.len(),
                texts.len()
            )));
        }

        predictions.into_iter().map(top_label).collect()
    }
}
