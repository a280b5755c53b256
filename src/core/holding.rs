//! Holdings as stored by the portfolio backend.

use crate::core::ticker::Ticker;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A position in the portfolio. Prices are in the quote currency (USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: u64,
    pub name: String,
    pub ticker: String,
    /// Signed like the backend's column; records with no shares still load.
    pub quantity: i32,
    pub buy_price: f64,
    /// Last price the backend knew about, used when a live quote is unavailable.
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl Holding {
    pub fn ticker(&self) -> Result<Ticker> {
        Ticker::parse(&self.ticker)
    }
}

/// The editable fields of a holding, validated before being sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDraft {
    pub name: String,
    pub ticker: Ticker,
    pub quantity: u32,
    pub buy_price: f64,
}

impl HoldingDraft {
    pub fn new(name: &str, ticker: &str, quantity: u32, buy_price: f64) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("Name must not be empty"));
        }
        if quantity == 0 || i32::try_from(quantity).is_err() {
            return Err(anyhow!("Quantity must be between 1 and {}", i32::MAX));
        }
        if !(buy_price.is_finite() && buy_price > 0.0) {
            return Err(anyhow!("Buy price must be a positive number, got {buy_price}"));
        }
        Ok(Self {
            name: name.to_string(),
            ticker: Ticker::parse(ticker)?,
            quantity,
            buy_price,
        })
    }
}

/// CRUD access to the holdings kept by the backend.
#[async_trait]
pub trait HoldingStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Holding>>;
    async fn get(&self, id: u64) -> Result<Holding>;
    async fn create(&self, draft: &HoldingDraft) -> Result<Holding>;
    async fn update(&self, id: u64, draft: &HoldingDraft) -> Result<Holding>;
    async fn delete(&self, id: u64) -> Result<()>;
}
