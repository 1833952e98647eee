//! Request-level orchestration of the two analysis kinds.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tickerscope_core::AppConfig;

use crate::capability::{EntityRecognizer, SentimentClassifier, TickerLookup};
use crate::entities::EntityDeduplicator;
use crate::error::AnalysisError;
use crate::outcome::Outcome;
use crate::regroup::{flatten, regroup};
use crate::resolver::{ResolverConfig, TickerResolver};
use crate::retry::Backoff;
use crate::scorer::{DeterminationPolicy, SentimentScorer, INCONCLUSIVE};
use crate::types::{SentimentReport, TickerReport};

/// Tuning knobs for [`AnalysisPipeline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub sentiment_batch_size: NonZeroUsize,
    pub sentiment_concurrency: NonZeroUsize,
    pub ner_batch_size: NonZeroUsize,
    pub extraction_concurrency: NonZeroUsize,
    pub policy: DeterminationPolicy,
    pub resolver: ResolverConfig,
    pub request_deadline: Duration,
    pub max_request_texts: NonZeroUsize,
}

impl PipelineConfig {
    /// Derives pipeline settings from the application config, picking batch
    /// sizes for the configured device class.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let (sentiment_batch_size, ner_batch_size) = config.batch_limits.for_device(config.device);
        Self {
            sentiment_batch_size,
            sentiment_concurrency: config.sentiment_concurrency,
            ner_batch_size,
            extraction_concurrency: config.extraction_concurrency(),
            policy: DeterminationPolicy {
                mode: config.determination_mode,
                inconclusive_band: config.inconclusive_band,
            },
            resolver: ResolverConfig {
                concurrency: config.lookup_concurrency,
                max_retries: config.lookup_max_retries,
                backoff: Backoff::new(
                    config.lookup_retry_backoff_base_ms,
                    config.lookup_retry_max_delay_ms,
                ),
            },
            request_deadline: Duration::from_secs(config.request_deadline_secs),
            max_request_texts: config.max_request_texts,
        }
    }
}

/// Composes the scorer, regrouper, deduplicator and resolver.
pub struct AnalysisPipeline {
    scorer: SentimentScorer,
    deduplicator: EntityDeduplicator,
    resolver: TickerResolver,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        recognizer: Arc<dyn EntityRecognizer>,
        lookup: Arc<dyn TickerLookup>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            scorer: SentimentScorer::new(
                classifier,
                config.policy,
                config.sentiment_batch_size,
                config.sentiment_concurrency,
            ),
            deduplicator: EntityDeduplicator::new(
                recognizer,
                config.ner_batch_size,
                config.extraction_concurrency,
            ),
            resolver: TickerResolver::new(lookup, config.resolver),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scores every text and returns determinations in the caller's grouping.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MalformedInput`] for an empty or oversized request.
    /// - [`AnalysisError::GroupSizeMismatch`] if the scored stream does not
    ///   line up with the request's groups.
    /// - [`AnalysisError::DeadlineExceeded`] if the request deadline elapses.
    pub async fn analyze_sentiment(
        &self,
        groups: Vec<Vec<String>>,
    ) -> Result<SentimentReport, AnalysisError> {
        if groups.is_empty() {
            return Err(AnalysisError::MalformedInput(
                "request contains no groups".to_string(),
            ));
        }
        let (texts, group_sizes) = flatten(groups);
        self.check_text_count(texts.len())?;

        self.with_deadline(async {
            let outcomes = self.scorer.score(&texts).await;
            let degraded_items = outcomes.iter().filter(|o| o.is_skipped()).count();
            let flat: Vec<f64> = outcomes
                .into_iter()
                .map(|o: Outcome<f64>| o.unwrap_or(INCONCLUSIVE))
                .collect();
            let results = regroup(flat, &group_sizes)?;

            tracing::info!(
                groups = group_sizes.len(),
                texts = texts.len(),
                degraded_items,
                "sentiment analysis complete"
            );
            Ok(SentimentReport {
                results,
                degraded_items,
            })
        })
        .await
    }

    /// Extracts organizations from the texts and resolves them to tickers.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MalformedInput`] for an empty or oversized request.
    /// - [`AnalysisError::DeadlineExceeded`] if the request deadline elapses.
    pub async fn find_tickers(&self, texts: Vec<String>) -> Result<TickerReport, AnalysisError> {
        if texts.is_empty() {
            return Err(AnalysisError::MalformedInput(
                "request contains no texts".to_string(),
            ));
        }
        self.check_text_count(texts.len())?;

        self.with_deadline(async {
            let organizations = self.deduplicator.extract_and_dedupe(&texts).await;
            let resolution = self.resolver.resolve(&organizations).await;
            let report = TickerReport {
                symbols: resolution.symbols(),
                unresolved: resolution.unresolved(),
                organizations,
            };

            tracing::info!(
                texts = texts.len(),
                organizations = report.organizations.len(),
                symbols = report.symbols.len(),
                "ticker discovery complete"
            );
            Ok(report)
        })
        .await
    }

    fn check_text_count(&self, count: usize) -> Result<(), AnalysisError> {
        let max = self.config.max_request_texts.get();
        if count > max {
            return Err(AnalysisError::MalformedInput(format!(
                "request contains {count} texts; the limit is {max}"
            )));
        }
        Ok(())
    }

    /// Runs `work` under the request deadline. Work still in flight when the
    /// deadline passes is dropped and nothing partial is returned.
    async fn with_deadline<T, F>(&self, work: F) -> Result<T, AnalysisError>
    where
        F: Future<Output = Result<T, AnalysisError>>,
    {
        let deadline = self.config.request_deadline;
        if let Ok(result) = tokio::time::timeout(deadline, work).await {
            result
        } else {
            tracing::warn!(?deadline, "request deadline exceeded; discarding partial results");
            Err(AnalysisError::DeadlineExceeded(deadline))
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
