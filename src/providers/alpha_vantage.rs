//! Alpha Vantage `GLOBAL_QUOTE` price provider.
//!
//! The free tier allows only a handful of calls per minute, so this provider is
//! meant to sit behind the rate limited fetcher rather than be called directly.

use crate::core::price::{PriceError, PriceProvider};
use crate::core::ticker::Ticker;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder().user_agent("stockify/0.1").build()?;
        Ok(AlphaVantageProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn quote_url(&self, ticker: &Ticker) -> Result<Url, PriceError> {
        Url::parse_with_params(
            &format!("{}/query", self.base_url),
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| network_error(ticker, e))
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    // Rate limit and key problems come back as 200 with one of these set.
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

fn network_error(ticker: &Ticker, e: impl std::fmt::Display) -> PriceError {
    PriceError::Network {
        ticker: ticker.to_string(),
        message: e.to_string(),
    }
}

fn parse_quote(ticker: &Ticker, body: &str) -> Result<f64, PriceError> {
    let response: GlobalQuoteResponse = serde_json::from_str(body).map_err(|e| {
        debug!("Unparseable quote response for {}: {}", ticker, e);
        PriceError::NoData(ticker.to_string())
    })?;

    if let Some(message) = response
        .note
        .as_ref()
        .or(response.information.as_ref())
        .or(response.error_message.as_ref())
    {
        warn!("Alpha Vantage returned no quote for {}: {}", ticker, message);
    }

    let raw = response
        .global_quote
        .and_then(|quote| quote.price)
        .ok_or_else(|| PriceError::NoData(ticker.to_string()))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|_| PriceError::InvalidPrice {
            ticker: ticker.to_string(),
            raw: raw.clone(),
        })
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    #[instrument(
        name = "AlphaVantageQuote",
        skip(self),
        fields(ticker = %ticker)
    )]
    async fn fetch_price(&self, ticker: &Ticker) -> Result<f64, PriceError> {
        let url = self.quote_url(ticker)?;
        debug!("Requesting quote for {}", ticker);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(ticker, e))?;

        if !response.status().is_success() {
            return Err(network_error(
                ticker,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let body = response.text().await.map_err(|e| network_error(ticker, e))?;
        let price = parse_quote(ticker, &body)?;
        debug!("Received quote for {}: {}", ticker, price);
        Ok(price)
    }
}
