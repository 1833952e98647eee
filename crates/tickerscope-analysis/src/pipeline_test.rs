use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tickerscope_core::{BatchLimits, ConfidenceBand, DeterminationMode, DeviceClass, Environment};

use super::*;
use crate::error::{InferenceError, LookupError};
use crate::types::{Classification, EntityKind, EntitySpan, SentimentLabel};

fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// "good" → Positive 0.9, "bad" → Negative 0.9, "slow" sleeps for a minute,
/// "oom" fails its chunk, anything else → Neutral.
struct StubClassifier {
    calls: AtomicUsize,
}

#[async_trait]
impl SentimentClassifier for StubClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("slow") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if text.contains("oom") {
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

struct StubRecognizer;

#[async_trait]
impl EntityRecognizer for StubRecognizer {
    async fn extract_entities(&self, text: &str) -> Result<Vec<EntitySpan>, InferenceError> {
        Ok(["Apple", "Tesla", "Unknown Corp"]
            .into_iter()
            .filter(|name| text.contains(name))
            .map(|name| EntitySpan::new(name, EntityKind::Organization))
            .collect())
    }
}

struct StubLookup;

#[async_trait]
impl TickerLookup for StubLookup {
    async fn lookup_symbol(&self, name: &str) -> Result<Option<String>, LookupError> {
        match name {
            "Apple" => Ok(Some("AAPL".to_string())),
            "Tesla" => Ok(Some("TSLA".to_string())),
            _ => Ok(None),
        }
    }
}

fn test_config(batch: usize) -> PipelineConfig {
    PipelineConfig {
        sentiment_batch_size: size(batch),
        sentiment_concurrency: size(2),
        ner_batch_size: size(batch),
        extraction_concurrency: size(1),
        policy: DeterminationPolicy::ternary(),
        resolver: ResolverConfig {
            concurrency: size(4),
            max_retries: 0,
            backoff: Backoff::new(0, 0),
        },
        request_deadline: Duration::from_secs(5),
        max_request_texts: size(100),
    }
}

fn pipeline(config: PipelineConfig) -> AnalysisPipeline {
    AnalysisPipeline::new(
        Arc::new(StubClassifier {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(StubRecognizer),
        Arc::new(StubLookup),
        config,
    )
}

#[tokio::test]
async fn sentiment_preserves_group_shape_across_chunk_boundaries() {
    for batch in 1..=5 {
        let p = pipeline(test_config(batch));
        let groups = vec![strings(&["good news"]), strings(&["bad", "news", "ok"])];

        let report = p.analyze_sentiment(groups).await.expect("analysis succeeds");

        assert_eq!(
            report.results,
            vec![vec![1.0], vec![-1.0, 0.0, 0.0]],
            "batch size {batch}"
        );
        assert_eq!(report.degraded_items, 0);
    }
}

#[tokio::test]
async fn empty_groups_are_echoed() {
    let p = pipeline(test_config(2));
    let groups = vec![Vec::new(), strings(&["good"]), Vec::new()];

    let report = p.analyze_sentiment(groups).await.unwrap();

    assert_eq!(report.results, vec![vec![], vec![1.0], vec![]]);
}

#[tokio::test]
async fn degraded_chunk_is_counted_and_scored_inconclusive() {
    let p = pipeline(test_config(2));
    let groups = vec![strings(&["good", "bad"]), strings(&["oom", "good"]), strings(&["bad"])];

    let report = p.analyze_sentiment(groups).await.unwrap();

    assert_eq!(
        report.results,
        vec![vec![1.0, -1.0], vec![0.0, 0.0], vec![-1.0]]
    );
    assert_eq!(report.degraded_items, 2);
}

#[tokio::test]
async fn confidence_weighted_policy_flows_through() {
    let mut config = test_config(4);
    config.policy = DeterminationPolicy::confidence_weighted(None);
    let p = pipeline(config);

    let report = p
        .analyze_sentiment(vec![strings(&["good", "bad", "flat"])])
        .await
        .unwrap();

    assert_eq!(report.results, vec![vec![0.9, -1.0, 0.0]]);
}

#[tokio::test]
async fn no_groups_is_malformed() {
    let p = pipeline(test_config(2));
    let err = p.analyze_sentiment(Vec::new()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedInput(_)));
}

#[tokio::test]
async fn oversized_request_is_rejected_before_any_inference() {
    let classifier = Arc::new(StubClassifier {
        calls: AtomicUsize::new(0),
    });
    let mut config = test_config(2);
    config.max_request_texts = size(3);
    let p = AnalysisPipeline::new(
        Arc::clone(&classifier) as Arc<dyn SentimentClassifier>,
        Arc::new(StubRecognizer),
        Arc::new(StubLookup),
        config,
    );

    let err = p
        .analyze_sentiment(vec![strings(&["a", "b"]), strings(&["c", "d"])])
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::MalformedInput(_)));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_fails_the_whole_request() {
    let p = pipeline(test_config(1));
    let groups = vec![strings(&["good", "slow", "bad"])];

    let err = p.analyze_sentiment(groups).await.unwrap_err();

    assert!(matches!(err, AnalysisError::DeadlineExceeded(d) if d == Duration::from_secs(5)));
}

#[tokio::test]
async fn find_tickers_dedupes_and_resolves() {
    let p = pipeline(test_config(2));
    let texts = strings(&[
        "Apple is up",
        "Apple reported earnings",
        "Tesla fell",
        "Unknown Corp expands",
    ]);

    let report = p.find_tickers(texts).await.unwrap();

    let set = |items: &[&str]| items.iter().map(ToString::to_string).collect::<BTreeSet<_>>();
    assert_eq!(report.organizations, set(&["Apple", "Tesla", "Unknown Corp"]));
    assert_eq!(report.symbols, set(&["AAPL", "TSLA"]));
    assert_eq!(report.unresolved, set(&["Unknown Corp"]));
}

#[tokio::test]
async fn find_tickers_without_organizations_is_empty_not_an_error() {
    let p = pipeline(test_config(2));
    let report = p.find_tickers(strings(&["markets were quiet"])).await.unwrap();
    assert!(report.organizations.is_empty());
    assert!(report.symbols.is_empty());
}

#[tokio::test]
async fn find_tickers_rejects_empty_request() {
    let p = pipeline(test_config(2));
    let err = p.find_tickers(Vec::new()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedInput(_)));
}

fn assert_send<T: Send>(value: T) -> T {
    value
}

#[tokio::test]
async fn pipeline_futures_can_be_spawned() {
    let p = Arc::new(pipeline(test_config(2)));

    let sentiment = {
        let p = Arc::clone(&p);
        tokio::spawn(async move {
            assert_send(p.analyze_sentiment(vec![strings(&["good", "bad", "meh"])])).await
        })
    };
    let tickers = {
        let p = Arc::clone(&p);
        tokio::spawn(async move {
            assert_send(p.find_tickers(strings(&["Apple and Tesla", "Unknown Corp"]))).await
        })
    };

    let sentiment = sentiment.await.expect("task joins").expect("analysis succeeds");
    assert_eq!(sentiment.results, vec![vec![1.0, -1.0, 0.0]]);

    let tickers = tickers.await.expect("task joins").expect("discovery succeeds");
    assert_eq!(tickers.symbols, BTreeSet::from(["AAPL".to_string(), "TSLA".to_string()]));
}

#[test]
fn pipeline_config_follows_device_class() {
    let app = AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "info".to_string(),
        device: DeviceClass::Gpu,
        available_cores: size(8),
        batch_limits: BatchLimits {
            sentiment_gpu: size(128),
            sentiment_cpu: size(32),
            ner_gpu: size(256),
            ner_cpu: size(16),
        },
        sentiment_concurrency: size(2),
        lookup_concurrency: size(6),
        lookup_max_retries: 1,
        lookup_retry_backoff_base_ms: 100,
        lookup_retry_max_delay_ms: 2_000,
        determination_mode: DeterminationMode::ConfidenceWeighted,
        inconclusive_band: Some(ConfidenceBand::new(0.5, 0.55).unwrap()),
        request_deadline_secs: 30,
        max_request_texts: size(500),
        classifier_url: "http://classifier".to_string(),
        ner_url: "http://ner".to_string(),
        lookup_url: "http://lookup".to_string(),
        http_timeout_secs: 10,
        user_agent: "test".to_string(),
        rate_limit_per_minute: 60,
    };

    let config = PipelineConfig::from_app_config(&app);

    assert_eq!(config.sentiment_batch_size.get(), 128);
    assert_eq!(config.ner_batch_size.get(), 256);
    assert_eq!(config.extraction_concurrency.get(), 1);
    assert_eq!(config.policy.mode, DeterminationMode::ConfidenceWeighted);
    assert!(config.policy.inconclusive_band.is_some());
    assert_eq!(config.resolver.concurrency.get(), 6);
    assert_eq!(config.resolver.max_retries, 1);
    assert_eq!(config.resolver.backoff, Backoff::new(100, 2_000));
    assert_eq!(config.request_deadline, Duration::from_secs(30));
    assert_eq!(config.max_request_texts.get(), 500);
}
