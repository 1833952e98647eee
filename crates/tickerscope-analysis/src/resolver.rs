//! Organization name → ticker symbol resolution with per-name failure isolation.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::capability::TickerLookup;
use crate::outcome::{Outcome, SkipReason};
use crate::retry::{retry_with_backoff, Backoff};
use crate::types::{ResolutionReport, ResolvedTicker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub concurrency: NonZeroUsize,
    /// Extra attempts on transient lookup errors. Zero means one attempt per name.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN),
            max_retries: 0,
            backoff: Backoff::new(500, 5_000),
        }
    }
}

pub struct TickerResolver {
    lookup: Arc<dyn TickerLookup>,
    config: ResolverConfig,
}

impl TickerResolver {
    #[must_use]
    pub fn new(lookup: Arc<dyn TickerLookup>, config: ResolverConfig) -> Self {
        Self { lookup, config }
    }

    /// Looks up every name independently, up to `concurrency` at a time.
    ///
    /// A failed or empty lookup marks that name skipped; it never aborts the
    /// others. The report lists every name in no particular order.
    pub async fn resolve(&self, names: &BTreeSet<String>) -> ResolutionReport {
        let pending: Vec<_> = names.iter().map(|name| self.resolve_named(name)).collect();
        let tickers: Vec<ResolvedTicker> = stream::iter(pending)
            .buffer_unordered(self.config.concurrency.get())
            .collect()
            .await;

        let report = ResolutionReport { tickers };
        tracing::debug!(
            names = names.len(),
            resolved = report.tickers.len() - report.unresolved().len(),
            "ticker resolution complete"
        );
        report
    }

    /// Convenience over [`Self::resolve`] returning only the symbol set.
    pub async fn resolve_symbols(&self, names: &BTreeSet<String>) -> BTreeSet<String> {
        self.resolve(names).await.symbols()
    }

    async fn resolve_named(&self, name: &str) -> ResolvedTicker {
        ResolvedTicker {
            name: name.to_string(),
            resolution: self.resolve_one(name).await,
        }
    }

    async fn resolve_one(&self, name: &str) -> Outcome<String> {
        let result = retry_with_backoff(
            self.config.max_retries,
            self.config.backoff,
            || self.lookup.lookup_symbol(name),
        )
        .await;

        match result {
            Ok(Some(symbol)) => {
                let symbol = symbol.trim();
                if symbol.is_empty() {
                    tracing::debug!(name, "lookup returned a blank symbol; skipping");
                    Outcome::Skipped(SkipReason::NotFound)
                } else {
                    tracing::debug!(name, symbol, "resolved ticker");
                    Outcome::Resolved(symbol.to_string())
                }
            }
            Ok(None) => {
                tracing::debug!(name, "no ticker found");
                Outcome::Skipped(SkipReason::NotFound)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "ticker lookup failed; skipping");
                Outcome::Skipped(SkipReason::LookupFailed(e.to_string()))
            }
        }
    }
}
