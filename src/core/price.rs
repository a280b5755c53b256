//! Pricing abstractions and core types

use crate::core::ticker::Ticker;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why a single ticker could not be priced. None of these are fatal to the
/// application; callers degrade the affected ticker to a fallback value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PriceError {
    #[error("Network error fetching {ticker}: {message}")]
    Network { ticker: String, message: String },

    #[error("No data available for {0}")]
    NoData(String),

    #[error("Invalid price data for {ticker}: {raw}")]
    InvalidPrice { ticker: String, raw: String },

    #[error("Request for {ticker} timed out after {timeout:?}")]
    Timeout { ticker: String, timeout: Duration },

    #[error("Price queue is full ({0} pending requests)")]
    QueueFull(usize),

    #[error("Price fetcher stopped before {0} was settled")]
    WorkerGone(String),
}

/// A source of current prices for a ticker.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(&self, ticker: &Ticker) -> Result<f64, PriceError>;
}

/// Checks the provider returned a usable quote.
pub fn validate_price(ticker: &Ticker, price: f64) -> Result<f64, PriceError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PriceError::InvalidPrice {
            ticker: ticker.to_string(),
            raw: price.to_string(),
        })
    }
}
