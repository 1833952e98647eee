//! The three external services the pipeline consumes.
//!
//! Each is a narrow async trait so the pipeline can run against HTTP-backed
//! clients in production and deterministic stubs in tests.

use async_trait::async_trait;

use crate::error::{InferenceError, LookupError};
use crate::types::{Classification, EntitySpan};

/// Sentiment classifier.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, InferenceError>;

    /// Classifies a whole chunk, one result per text in input order.
    ///
    /// The default calls [`Self::classify`] once per text and fails the chunk
    /// on the first error. Implementations that can take a batch in one call
    /// should override it.
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>, InferenceError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.classify(text).await?);
        }
        Ok(out)
    }
}

/// Named-entity recognizer.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, InferenceError>;

    /// Extracts entities for a chunk, one list per text in input order.
    async fn extract_batch(&self, texts: &[String]) -> Result<Vec<Vec<EntitySpan>>, InferenceError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.extract_entities(text).await?);
        }
        Ok(out)
    }
}

/// Ticker symbol lookup. `Ok(None)` means the name is unknown.
#[async_trait]
pub trait TickerLookup: Send + Sync {
    async fn lookup_symbol(&self, name: &str) -> Result<Option<String>, LookupError>;
}
