//! Ticker lookup against the Yahoo Finance search endpoint.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::build_http_client;
use crate::capability::TickerLookup;
use crate::error::LookupError;

/// Resolves a company name to the symbol of the first quote Yahoo returns.
pub struct YahooSymbolLookup {
    client: Client,
    search_url: Url,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    symbol: Option<String>,
}

impl YahooSymbolLookup {
    /// # Errors
    ///
    /// Returns [`LookupError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`LookupError::InvalidBaseUrl`] if `base_url` is not a valid URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, LookupError> {
        let normalised = format!("{}/v1/finance/search", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .map_err(|e| LookupError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            search_url,
        })
    }

    /// Builds the search URL: one quote, no news.
    fn build_url(&self, name: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", name)
            .append_pair("quotesCount", "1")
            .append_pair("newsCount", "0");
        url
    }
}

#[async_trait]
impl TickerLookup for YahooSymbolLookup {
    async fn lookup_symbol(&self, name: &str) -> Result<Option<String>, LookupError> {
        let url = self.build_url(name);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Deserialize {
                context: format!("search(q={name})"),
                source: e,
            })?;

        Ok(parsed
            .quotes
            .into_iter()
            .next()
            .and_then(|q| q.symbol)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }
}
