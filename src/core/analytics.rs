//! Derived portfolio metrics: live valuation, top performer and distribution.
use crate::core::holding::Holding;
use crate::core::ticker::Ticker;
use crate::quotes::{PriceService, with_fallback};
use std::collections::BTreeMap;
use tracing::debug;

/// A holding priced in the display currency.
#[derive(Debug, Clone)]
pub struct HoldingValue {
    pub holding: Holding,
    /// Live price if it resolved, otherwise the backend's last price or zero.
    pub price: f64,
    pub buy_price: f64,
    pub value: f64,
    pub live: bool,
}

impl HoldingValue {
    /// Shares counted toward value; non-positive backend quantities count as none.
    pub fn shares(&self) -> f64 {
        f64::from(self.holding.quantity.max(0))
    }

    pub fn gain(&self) -> f64 {
        (self.price - self.buy_price) * self.shares()
    }

    /// Percentage change from the buy price, if the buy price is usable.
    pub fn change_pct(&self) -> Option<f64> {
        (self.buy_price > 0.0).then(|| (self.price - self.buy_price) / self.buy_price * 100.0)
    }
}

/// Share of the portfolio held under one name.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub name: String,
    pub value: f64,
    pub weight: f64,
}

#[derive(Debug)]
pub struct PortfolioValue {
    pub holdings: Vec<HoldingValue>,
    pub total_value: f64,
    pub currency: String,
}

impl PortfolioValue {
    /// The holding with the highest percentage change, first one wins ties.
    /// Holdings without shares are ignored.
    pub fn top_performer(&self) -> Option<&HoldingValue> {
        self.holdings
            .iter()
            .filter(|h| h.holding.quantity > 0)
            .filter_map(|h| h.change_pct().map(|pct| (h, pct)))
            .fold(None, |best: Option<(&HoldingValue, f64)>, (h, pct)| match best {
                Some((_, best_pct)) if best_pct >= pct => best,
                _ => Some((h, pct)),
            })
            .map(|(h, _)| h)
    }

    /// Value and weight per holding name, largest first. Empty when the
    /// portfolio has no positive value.
    pub fn distribution(&self) -> Vec<Allocation> {
        if self.total_value <= 0.0 {
            debug!("Total portfolio value is zero, no distribution");
            return Vec::new();
        }

        let mut by_name: BTreeMap<&str, f64> = BTreeMap::new();
        for h in self.holdings.iter().filter(|h| h.value > 0.0) {
            *by_name.entry(h.holding.name.as_str()).or_default() += h.value;
        }

        let mut allocations: Vec<Allocation> = by_name
            .into_iter()
            .map(|(name, value)| Allocation {
                name: name.to_string(),
                value,
                weight: value / self.total_value * 100.0,
            })
            .collect();
        allocations.sort_by(|a, b| b.value.total_cmp(&a.value));
        allocations
    }
}

/// Prices every holding through `prices` and converts into the display currency.
///
/// A holding whose ticker is malformed or whose lookup fails is valued at the
/// backend's last known price, or zero if there is none. Holdings without
/// shares are not looked up and add nothing to the total. Progress updates are
/// reported via `update_callback`, once per holding.
pub async fn calculate_portfolio_value(
    holdings: &[Holding],
    prices: &PriceService,
    conversion_rate: f64,
    currency: &str,
    update_callback: &(dyn Fn() + Send + Sync),
) -> PortfolioValue {
    // Only holdings with shares and a valid ticker go to the price service.
    let mut lookups: Vec<(usize, Ticker)> = Vec::new();
    for (index, holding) in holdings.iter().enumerate() {
        if holding.quantity <= 0 {
            debug!(
                "Skipping price lookup for holding {}: quantity {}",
                holding.id, holding.quantity
            );
            update_callback();
            continue;
        }
        match holding.ticker() {
            Ok(ticker) => lookups.push((index, ticker)),
            Err(e) => {
                debug!("Skipping price lookup for holding {}: {}", holding.id, e);
                update_callback();
            }
        }
    }

    let tickers: Vec<Ticker> = lookups.iter().map(|(_, t)| t.clone()).collect();
    let results = prices.resolve_all(&tickers, update_callback).await;

    // (quote, live) per holding, starting from the backend's last known price.
    let mut quotes: Vec<(f64, bool)> = holdings
        .iter()
        .map(|h| (h.current_price.unwrap_or(0.0), false))
        .collect();
    for ((index, ticker), result) in lookups.iter().zip(results) {
        let live = result.is_ok();
        let fallback = quotes[*index].0;
        quotes[*index] = (with_fallback(ticker, result, fallback), live);
    }

    let mut total_value = 0.0;
    let values: Vec<HoldingValue> = holdings
        .iter()
        .zip(quotes)
        .map(|(holding, (quote, live))| {
            let mut value = HoldingValue {
                holding: holding.clone(),
                price: quote * conversion_rate,
                buy_price: holding.buy_price * conversion_rate,
                value: 0.0,
                live,
            };
            value.value = value.price * value.shares();
            total_value += value.value;
            value
        })
        .collect();

    PortfolioValue {
        holdings: values,
        total_value,
        currency: currency.to_string(),
    }
}
