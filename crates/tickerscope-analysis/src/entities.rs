//! Organization extraction and request-wide deduplication.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::batch::batch;
use crate::capability::EntityRecognizer;
use crate::outcome::{Outcome, SkipReason};
use crate::types::{EntityKind, EntitySpan};

/// Normalizes an organization name: trims and collapses whitespace runs.
///
/// Case is preserved. Returns `None` when nothing is left.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Collects the unique organization names mentioned across a request.
pub struct EntityDeduplicator {
    recognizer: Arc<dyn EntityRecognizer>,
    max_batch_size: NonZeroUsize,
    concurrency: NonZeroUsize,
}

impl EntityDeduplicator {
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        max_batch_size: NonZeroUsize,
        concurrency: NonZeroUsize,
    ) -> Self {
        Self {
            recognizer,
            max_batch_size,
            concurrency,
        }
    }

    /// Runs the recognizer over every text and returns the normalized,
    /// deduplicated organization names.
    ///
    /// Texts the recognizer cannot process are logged and skipped. An empty
    /// set is a valid result.
    pub async fn extract_and_dedupe(&self, texts: &[String]) -> BTreeSet<String> {
        let chunks = batch(texts, self.max_batch_size);

        let pending: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| self.extract_chunk(index, chunk))
            .collect();
        let outcomes: Vec<Vec<Outcome<Vec<EntitySpan>>>> = stream::iter(pending)
            .buffer_unordered(self.concurrency.get())
            .collect()
            .await;

        let mut names = BTreeSet::new();
        let mut skipped = 0usize;
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Outcome::Resolved(spans) => names.extend(organization_names(spans)),
                Outcome::Skipped(_) => skipped += 1,
            }
        }

        tracing::debug!(
            texts = texts.len(),
            skipped,
            organizations = names.len(),
            "entity extraction complete"
        );
        names
    }

    /// Extracts one chunk. If the chunk call fails, every text is retried on
    /// its own so one bad text only costs itself.
    async fn extract_chunk(&self, index: usize, chunk: &[String]) -> Vec<Outcome<Vec<EntitySpan>>> {
        match self.recognizer.extract_batch(chunk).await {
            Ok(spans) if spans.len() == chunk.len() => {
                return spans.into_iter().map(Outcome::Resolved).collect();
            }
            Ok(spans) => tracing::warn!(
                chunk = index,
                expected = chunk.len(),
                got = spans.len(),
                "recognizer returned wrong number of results; retrying texts individually"
            ),
            Err(e) => tracing::warn!(
                chunk = index,
                size = chunk.len(),
                error = %e,
                "recognizer chunk failed; retrying texts individually"
            ),
        }

        let mut out = Vec::with_capacity(chunk.len());
        for (offset, text) in chunk.iter().enumerate() {
            match self.recognizer.extract_entities(text).await {
                Ok(spans) => out.push(Outcome::Resolved(spans)),
                Err(e) => {
                    tracing::warn!(
                        chunk = index,
                        offset,
                        error = %e,
                        "entity extraction failed for text; skipping"
                    );
                    out.push(Outcome::Skipped(SkipReason::InferenceUnavailable(
                        e.to_string(),
                    )));
                }
            }
        }
        out
    }
}

fn organization_names(spans: Vec<EntitySpan>) -> impl Iterator<Item = String> {
    spans
        .into_iter()
        .filter(|s| s.kind == EntityKind::Organization)
        .filter_map(|s| normalize_name(&s.text))
}
