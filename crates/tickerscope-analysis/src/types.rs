use std::collections::BTreeSet;

use serde::Serialize;

use crate::outcome::Outcome;

/// Sentiment label as reported by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Any label the classifier emits that is not one of the three above.
    Other(String),
}

impl SentimentLabel {
    /// Parses a classifier label, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "neutral" => Self::Neutral,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

/// One classifier verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Probability of `label`, in `[0, 1]`.
    pub confidence: f64,
}

impl Classification {
    #[must_use]
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    Person,
    Location,
    Other(String),
}

impl EntityKind {
    /// Maps recognizer labels (spaCy and CoNLL style) onto entity kinds.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "ORG" | "ORGANIZATION" => Self::Organization,
            "PERSON" | "PER" => Self::Person,
            "GPE" | "LOC" | "LOCATION" => Self::Location,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One entity mention found by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    /// Surface text exactly as it appeared.
    pub text: String,
    pub kind: EntityKind,
}

impl EntitySpan {
    #[must_use]
    pub fn new(text: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Result of the sentiment pipeline: one inner vector per request group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentReport {
    pub results: Vec<Vec<f64>>,
    /// Items whose chunk could not be classified and were scored 0.
    pub degraded_items: usize,
}

/// Lookup result for one unique organization name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTicker {
    pub name: String,
    pub resolution: Outcome<String>,
}

/// Every lookup attempted for a request, resolved or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub tickers: Vec<ResolvedTicker>,
}

impl ResolutionReport {
    /// Deduplicated, non-empty symbols.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<String> {
        self.tickers
            .iter()
            .filter_map(|t| t.resolution.value())
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }

    /// Names that produced no symbol.
    #[must_use]
    pub fn unresolved(&self) -> BTreeSet<String> {
        self.tickers
            .iter()
            .filter(|t| t.resolution.is_skipped())
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Result of the organization/ticker pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickerReport {
    pub organizations: BTreeSet<String>,
    pub symbols: BTreeSet<String>,
    pub unresolved: BTreeSet<String>,
}
