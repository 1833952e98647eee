//! Command handlers. Each takes raw JSON input and returns the JSON to print.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tickerscope_analysis::AnalysisPipeline;

#[derive(Debug, Serialize)]
struct SentimentOutput {
    results: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct TickersOutput {
    symbols: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organizations: Option<BTreeSet<String>>,
}

/// Reads the whole input file, or stdin when no path is given.
pub(crate) fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read stdin")?;
            Ok(raw)
        }
    }
}

pub(crate) async fn run_sentiment(pipeline: &AnalysisPipeline, raw: &str) -> anyhow::Result<String> {
    let groups: Vec<Vec<String>> =
        serde_json::from_str(raw).context("sentiment input must be a JSON array of string arrays")?;

    let report = pipeline.analyze_sentiment(groups).await?;
    if report.degraded_items > 0 {
        tracing::warn!(
            degraded_items = report.degraded_items,
            "some texts could not be classified and were scored 0"
        );
    }

    Ok(serde_json::to_string(&SentimentOutput {
        results: report.results,
    })?)
}

pub(crate) async fn run_tickers(
    pipeline: &AnalysisPipeline,
    raw: &str,
    with_organizations: bool,
) -> anyhow::Result<String> {
    let texts: Vec<String> =
        serde_json::from_str(raw).context("ticker input must be a JSON array of strings")?;

    let report = pipeline.find_tickers(texts).await?;
    if !report.unresolved.is_empty() {
        tracing::info!(
            unresolved = report.unresolved.len(),
            "some organizations did not resolve to a ticker"
        );
    }

    Ok(serde_json::to_string(&TickersOutput {
        symbols: report.symbols,
        organizations: with_organizations.then_some(report.organizations),
    })?)
}
