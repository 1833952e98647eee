//! Sentiment scoring: classifier verdicts to numeric determinations.

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tickerscope_core::{ConfidenceBand, DeterminationMode};

use crate::batch::batch;
use crate::capability::SentimentClassifier;
use crate::outcome::{Outcome, SkipReason};
use crate::types::{Classification, SentimentLabel};

/// Determination value for a neutral or inconclusive item.
pub const INCONCLUSIVE: f64 = 0.0;

/// Maps one classification to a determination in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminationPolicy {
    pub mode: DeterminationMode,
    /// When set, a confidence inside the band scores 0 whatever the label.
    pub inconclusive_band: Option<ConfidenceBand>,
}

impl DeterminationPolicy {
    #[must_use]
    pub fn ternary() -> Self {
        Self {
            mode: DeterminationMode::Ternary,
            inconclusive_band: None,
        }
    }

    #[must_use]
    pub fn confidence_weighted(inconclusive_band: Option<ConfidenceBand>) -> Self {
        Self {
            mode: DeterminationMode::ConfidenceWeighted,
            inconclusive_band,
        }
    }

    #[must_use]
    pub fn with_band(mut self, band: ConfidenceBand) -> Self {
        self.inconclusive_band = Some(band);
        self
    }

    #[must_use]
    pub fn determine(&self, classification: &Classification) -> f64 {
        let confidence = classification.confidence;
        if !confidence.is_finite() {
            return INCONCLUSIVE;
        }
        let confidence = confidence.clamp(0.0, 1.0);

        if self
            .inconclusive_band
            .is_some_and(|band| band.contains(confidence))
        {
            return INCONCLUSIVE;
        }

        match (&classification.label, self.mode) {
            (SentimentLabel::Positive, DeterminationMode::Ternary) => 1.0,
            (SentimentLabel::Positive, DeterminationMode::ConfidenceWeighted) => confidence,
            (SentimentLabel::Negative, _) => -1.0,
            (SentimentLabel::Neutral | SentimentLabel::Other(_), _) => INCONCLUSIVE,
        }
    }
}

/// Runs the classifier over chunks and applies a [`DeterminationPolicy`].
pub struct SentimentScorer {
    classifier: Arc<dyn SentimentClassifier>,
    policy: DeterminationPolicy,
    max_batch_size: NonZeroUsize,
    concurrency: NonZeroUsize,
}

impl SentimentScorer {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        policy: DeterminationPolicy,
        max_batch_size: NonZeroUsize,
        concurrency: NonZeroUsize,
    ) -> Self {
        Self {
            classifier,
            policy,
            max_batch_size,
            concurrency,
        }
    }

    #[must_use]
    pub fn policy(&self) -> DeterminationPolicy {
        self.policy
    }

    /// Scores one chunk: one outcome per text, in input order.
    ///
    /// A classifier failure, or a reply that does not line up with the chunk,
    /// degrades every item of the chunk.
    pub async fn score_chunk(&self, index: usize, chunk: &[String]) -> Vec<Outcome<f64>> {
        let reason = match self.classifier.classify_batch(chunk).await {
            Ok(classifications) if classifications.len() == chunk.len() => {
                return classifications
                    .iter()
                    .map(|c| Outcome::Resolved(self.policy.determine(c)))
                    .collect();
            }
            Ok(classifications) => format!(
                "classifier returned {} results for {} texts",
                classifications.len(),
                chunk.len()
            ),
            Err(e) => e.to_string(),
        };

        tracing::warn!(
            chunk = index,
            size = chunk.len(),
            error = %reason,
            "sentiment chunk degraded to inconclusive"
        );
        vec![Outcome::Skipped(SkipReason::InferenceUnavailable(reason)); chunk.len()]
    }

    /// Scores every text, batching by the configured chunk size.
    ///
    /// Up to `concurrency` chunks are in flight at once; results come back in
    /// chunk order regardless.
    pub async fn score(&self, texts: &[String]) -> Vec<Outcome<f64>> {
        let chunks = batch(texts, self.max_batch_size);
        tracing::debug!(
            texts = texts.len(),
            chunks = chunks.len(),
            max_batch_size = self.max_batch_size.get(),
            "scoring sentiment"
        );

        let pending: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| self.score_chunk(index, chunk))
            .collect();
        let scored: Vec<Vec<Outcome<f64>>> = stream::iter(pending)
            .buffered(self.concurrency.get())
            .collect()
            .await;

        scored.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::InferenceError;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn positive(confidence: f64) -> Classification {
        Classification::new(SentimentLabel::Positive, confidence)
    }

    /// Classifies by keyword; fails any chunk containing "boom".
    struct KeywordClassifier {
        calls: AtomicUsize,
    }

    impl KeywordClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SentimentClassifier for KeywordClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("boom") {
                return Err(InferenceError::Unavailable("CUDA out of memory".into()));
            }
            let label = if text.contains("good") {
                SentimentLabel::Positive
            } else if text.contains("bad") {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Neutral
            };
            Ok(Classification::new(label, 0.9))
        }
    }

    /// Returns one result fewer than asked for.
    struct ShortClassifier;

    #[async_trait]
    impl SentimentClassifier for ShortClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, InferenceError> {
            Ok(positive(0.9))
        }

        async fn classify_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<Classification>, InferenceError> {
            Ok(vec![positive(0.9); texts.len().saturating_sub(1)])
        }
    }

    /// Finishes later chunks first to prove ordering survives concurrency.
    struct ReverseLatencyClassifier;

    #[async_trait]
    impl SentimentClassifier for ReverseLatencyClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, InferenceError> {
            let n: u64 = text.parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50u64.saturating_sub(n * 5))).await;
            #[allow(clippy::cast_precision_loss)]
            let confidence = n as f64 / 100.0;
            Ok(positive(confidence))
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ternary_policy_maps_labels() {
        let policy = DeterminationPolicy::ternary();
        assert!((policy.determine(&positive(0.9)) - 1.0).abs() < f64::EPSILON);
        let negative = Classification::new(SentimentLabel::Negative, 0.9);
        assert!((policy.determine(&negative) + 1.0).abs() < f64::EPSILON);
        let neutral = Classification::new(SentimentLabel::Neutral, 0.9);
        assert!(policy.determine(&neutral).abs() < f64::EPSILON);
        let other = Classification::new(SentimentLabel::Other("LABEL_7".into()), 0.9);
        assert!(policy.determine(&other).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_weighted_policy_maps_labels() {
        let policy = DeterminationPolicy::confidence_weighted(None);
        assert!((policy.determine(&positive(0.8)) - 0.8).abs() < f64::EPSILON);
        let negative = Classification::new(SentimentLabel::Negative, 0.7);
        assert!((policy.determine(&negative) + 1.0).abs() < f64::EPSILON);
        let neutral = Classification::new(SentimentLabel::Neutral, 0.99);
        assert!(policy.determine(&neutral).abs() < f64::EPSILON);
    }

    #[test]
    fn band_overrides_label_and_policies_diverge_on_same_input() {
        let band = ConfidenceBand::new(0.50, 0.55).unwrap();
        let input = positive(0.52);

        let weighted = DeterminationPolicy::confidence_weighted(Some(band));
        let ternary = DeterminationPolicy::ternary();

        assert!(weighted.determine(&input).abs() < f64::EPSILON);
        assert!((ternary.determine(&input) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn band_also_applies_to_negative_labels() {
        let band = ConfidenceBand::new(0.50, 0.55).unwrap();
        let policy = DeterminationPolicy::ternary().with_band(band);
        let negative = Classification::new(SentimentLabel::Negative, 0.55);
        assert!(policy.determine(&negative).abs() < f64::EPSILON);
        let confident = Classification::new(SentimentLabel::Negative, 0.56);
        assert!((policy.determine(&confident) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_confidence_is_inconclusive() {
        let policy = DeterminationPolicy::confidence_weighted(None);
        assert!(policy.determine(&positive(f64::NAN)).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn single_item_ternary_chunk() {
        let scorer = SentimentScorer::new(
            Arc::new(KeywordClassifier::new()),
            DeterminationPolicy::ternary(),
            size(8),
            size(1),
        );
        for (text, expected) in [("good", 1.0), ("bad", -1.0), ("meh", 0.0)] {
            let out = scorer.score(&texts(&[text])).await;
            assert_eq!(out, vec![Outcome::Resolved(expected)], "text={text}");
        }
    }

    #[tokio::test]
    async fn failing_chunk_degrades_only_that_chunk() {
        let classifier = Arc::new(KeywordClassifier::new());
        let scorer = SentimentScorer::new(
            Arc::clone(&classifier) as Arc<dyn SentimentClassifier>,
            DeterminationPolicy::ternary(),
            size(2),
            size(1),
        );
        let input = texts(&["good", "bad", "boom", "good", "bad"]);

        let out = scorer.score(&input).await;

        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], Outcome::Resolved(1.0));
        assert_eq!(out[1], Outcome::Resolved(-1.0));
        assert!(out[2].is_skipped());
        assert!(out[3].is_skipped(), "same chunk as the failing text");
        assert_eq!(out[4], Outcome::Resolved(-1.0));
    }

    #[tokio::test]
    async fn length_mismatch_degrades_chunk() {
        let scorer = SentimentScorer::new(
            Arc::new(ShortClassifier),
            DeterminationPolicy::ternary(),
            size(4),
            size(1),
        );
        let out = scorer.score(&texts(&["a", "b", "c"])).await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Outcome::is_skipped));
    }

    #[tokio::test]
    async fn concurrent_chunks_keep_input_order() {
        let scorer = SentimentScorer::new(
            Arc::new(ReverseLatencyClassifier),
            DeterminationPolicy::confidence_weighted(None),
            size(1),
            size(8),
        );
        let input: Vec<String> = (0..8).map(|i| i.to_string()).collect();

        let out = scorer.score(&input).await;

        let values: Vec<f64> = out.into_iter().map(|o| o.unwrap_or(f64::NAN)).collect();
        let expected: Vec<f64> = (0..8).map(|i| f64::from(i) / 100.0).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let classifier = Arc::new(KeywordClassifier::new());
        let scorer = SentimentScorer::new(
            Arc::clone(&classifier) as Arc<dyn SentimentClassifier>,
            DeterminationPolicy::ternary(),
            size(4),
            size(1),
        );
        assert!(scorer.score(&[]).await.is_empty());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }
}
