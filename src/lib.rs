pub mod cli;
pub mod core;
pub mod providers;
pub mod quotes;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::alpha_vantage::AlphaVantageProvider;
use crate::providers::backend::RestHoldingStore;
use crate::quotes::{FetcherOptions, PriceCache, PriceService};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Summary,
    List,
    Add {
        name: String,
        ticker: String,
        quantity: u32,
        buy_price: f64,
    },
    Edit {
        id: u64,
        name: Option<String>,
        ticker: Option<String>,
        quantity: Option<u32>,
        buy_price: Option<f64>,
    },
    Delete {
        id: u64,
    },
    Price {
        tickers: Vec<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Stockify starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        backend = %config.backend.base_url,
        provider = %config.providers.alpha_vantage.base_url,
        "Loaded config"
    );

    let holdings = RestHoldingStore::new(&config.backend.base_url)?;

    match command {
        AppCommand::Summary => {
            let prices = build_price_service(&config)?;
            let result = cli::summary::run(&holdings, &prices, &config.display).await;
            prices.cache().flush();
            result
        }
        AppCommand::List => {
            let prices = build_price_service(&config)?;
            let result = cli::holdings::run(&holdings, &prices, &config.display).await;
            prices.cache().flush();
            result
        }
        AppCommand::Add {
            name,
            ticker,
            quantity,
            buy_price,
        } => cli::manage::add(&holdings, &name, &ticker, quantity, buy_price).await,
        AppCommand::Edit {
            id,
            name,
            ticker,
            quantity,
            buy_price,
        } => {
            let changes = cli::manage::HoldingChanges {
                name,
                ticker,
                quantity,
                buy_price,
            };
            cli::manage::edit(&holdings, id, changes).await
        }
        AppCommand::Delete { id } => cli::manage::delete(&holdings, id).await,
        AppCommand::Price { tickers } => {
            let prices = build_price_service(&config)?;
            let result = cli::price::run(&prices, &tickers, &config.display).await;
            prices.cache().flush();
            result
        }
    }
}

/// Wires the local cache, the Alpha Vantage provider and the rate limited
/// fetcher into one price service.
pub fn build_price_service(config: &AppConfig) -> Result<PriceService> {
    let av = &config.providers.alpha_vantage;
    let provider = AlphaVantageProvider::new(&av.base_url, &av.resolve_api_key()?)?;

    let store = store::open_store(config);
    let cache = Arc::new(PriceCache::new(store, config.cache.ttl()));
    let options = FetcherOptions {
        request_delay: av.request_delay(),
        timeout: av.timeout(),
        max_queue_depth: av.max_queue_depth,
    };

    Ok(PriceService::with_provider(
        Arc::new(provider),
        cache,
        options,
    ))
}
