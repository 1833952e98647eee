//! Text analytics aggregation for tickerscope.
//!
//! Scores grouped texts for sentiment through a classifier and extracts
//! organization names through an entity recognizer, resolving them to
//! stock ticker symbols. Model and lookup services sit behind the traits in
//! [`capability`]; [`clients`] holds the HTTP implementations.

pub mod batch;
pub mod capability;
pub mod clients;
pub mod entities;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod regroup;
pub mod resolver;
pub mod scorer;
pub mod types;

mod retry;

pub use capability::{EntityRecognizer, SentimentClassifier, TickerLookup};
pub use clients::{NerClient, TeiClassifier, YahooSymbolLookup};
pub use entities::EntityDeduplicator;
pub use error::{AnalysisError, InferenceError, LookupError};
pub use outcome::{Outcome, SkipReason};
pub use pipeline::{AnalysisPipeline, PipelineConfig};
pub use resolver::{ResolverConfig, TickerResolver};
pub use retry::Backoff;
pub use scorer::{DeterminationPolicy, SentimentScorer, INCONCLUSIVE};
pub use types::{
    Classification, EntityKind, EntitySpan, ResolutionReport, ResolvedTicker, SentimentLabel,
    SentimentReport, TickerReport,
};
