use crate::core::price::{PriceError, PriceProvider};
use crate::core::ticker::Ticker;
use crate::quotes::cache::PriceCache;
use crate::quotes::fetcher::{FetcherOptions, RateLimitedFetcher};
use futures::future::{Either, join_all, ready};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Entry point for price lookups: cache first, then the rate limited queue.
#[derive(Clone)]
pub struct PriceService {
    cache: Arc<PriceCache>,
    fetcher: RateLimitedFetcher,
}

impl PriceService {
    pub fn new(cache: Arc<PriceCache>, fetcher: RateLimitedFetcher) -> Self {
        Self { cache, fetcher }
    }

    /// Builds the cache-writing fetcher for `provider` and wraps both.
    pub fn with_provider(
        provider: Arc<dyn PriceProvider>,
        cache: Arc<PriceCache>,
        options: FetcherOptions,
    ) -> Self {
        let fetcher = RateLimitedFetcher::new(provider, Arc::clone(&cache), options);
        Self::new(cache, fetcher)
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &RateLimitedFetcher {
        &self.fetcher
    }

    #[instrument(name = "ResolvePrice", skip(self), fields(ticker = %ticker))]
    pub async fn resolve_price(&self, ticker: &Ticker) -> Result<f64, PriceError> {
        self.lookup(ticker).await
    }

    /// Resolves every ticker, returning results in input order.
    ///
    /// Cache checks and enqueues all happen before the first await, so misses
    /// reach the upstream provider in input order. `update_callback` runs once
    /// per settled ticker.
    pub async fn resolve_all(
        &self,
        tickers: &[Ticker],
        update_callback: &(dyn Fn() + Send + Sync),
    ) -> Vec<Result<f64, PriceError>> {
        let lookups: Vec<_> = tickers
            .iter()
            .map(|ticker| {
                let lookup = self.lookup(ticker);
                async move {
                    let result = lookup.await;
                    update_callback();
                    result
                }
            })
            .collect();
        join_all(lookups).await
    }

    /// Resolves `(ticker, fallback)` pairs. A failed lookup yields that
    /// position's fallback instead of failing the batch.
    pub async fn resolve_prices(&self, requests: &[(Ticker, f64)]) -> Vec<f64> {
        let tickers: Vec<Ticker> = requests.iter().map(|(t, _)| t.clone()).collect();
        let results = self.resolve_all(&tickers, &|| ()).await;

        results
            .into_iter()
            .zip(requests)
            .map(|(result, (ticker, fallback))| with_fallback(ticker, result, *fallback))
            .collect()
    }

    fn lookup(
        &self,
        ticker: &Ticker,
    ) -> impl Future<Output = Result<f64, PriceError>> + Send + 'static {
        match self.cache.get(ticker) {
            Some(price) => Either::Left(ready(Ok(price))),
            None => {
                debug!("No fresh price for {}, queueing", ticker);
                Either::Right(self.fetcher.enqueue(ticker.clone()))
            }
        }
    }
}

/// Unwraps a lookup result, logging and substituting `fallback` on failure.
pub fn with_fallback(ticker: &Ticker, result: Result<f64, PriceError>, fallback: f64) -> f64 {
    match result {
        Ok(price) => price,
        Err(e) => {
            warn!("Failed to fetch price for {}: {}", ticker, e);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockProvider {
        prices: HashMap<String, Result<f64, PriceError>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(prices: Vec<(&str, Result<f64, PriceError>)>) -> Self {
            Self {
                prices: prices
                    .into_iter()
                    .map(|(t, r)| (t.to_string(), r))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn fetch_price(&self, ticker: &Ticker) -> Result<f64, PriceError> {
            self.calls.lock().unwrap().push(ticker.to_string());
            self.prices
                .get(ticker.as_str())
                .cloned()
                .unwrap_or_else(|| Err(PriceError::NoData(ticker.to_string())))
        }
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn service(provider: Arc<MockProvider>) -> PriceService {
        let cache = Arc::new(PriceCache::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(900),
        ));
        PriceService::with_provider(provider, cache, FetcherOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_then_hit() {
        let provider = Arc::new(MockProvider::new(vec![("AAPL", Ok(150.25))]));
        let service = service(Arc::clone(&provider));
        let aapl = ticker("AAPL");

        assert_eq!(service.resolve_price(&aapl).await, Ok(150.25));
        assert_eq!(service.cache().get(&aapl), Some(150.25));

        assert_eq!(service.resolve_price(&aapl).await, Ok(150.25));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_queue() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let service = service(Arc::clone(&provider));
        let msft = ticker("MSFT");
        service.cache().put(&msft, 410.0, Utc::now());

        assert_eq!(service.resolve_price(&msft).await, Ok(410.0));
        assert_eq!(provider.call_count(), 0);
        assert_eq!(service.fetcher().worker_runs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_isolation() {
        let provider = Arc::new(MockProvider::new(vec![
            ("AAPL", Ok(150.0)),
            (
                "BAD",
                Err(PriceError::InvalidPrice {
                    ticker: "BAD".into(),
                    raw: "abc".into(),
                }),
            ),
            ("MSFT", Ok(410.0)),
        ]));
        let service = service(Arc::clone(&provider));

        let prices = service
            .resolve_prices(&[
                (ticker("AAPL"), 0.0),
                (ticker("BAD"), 99.5),
                (ticker("MSFT"), 0.0),
            ])
            .await;
        assert_eq!(prices, vec![150.0, 99.5, 410.0]);
        assert_eq!(
            *provider.calls.lock().unwrap(),
            vec!["AAPL".to_string(), "BAD".to_string(), "MSFT".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_quote_falls_back_without_caching() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let service = service(provider);
        let goog = ticker("GOOG");

        let result = service.resolve_price(&goog).await;
        assert_eq!(result, Err(PriceError::NoData("GOOG".into())));
        assert_eq!(with_fallback(&goog, result, 12.0), 12.0);
        assert_eq!(service.cache().get(&goog), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_all_mixes_hits_and_misses() {
        let provider = Arc::new(MockProvider::new(vec![("B", Ok(2.0))]));
        let service = service(Arc::clone(&provider));
        service.cache().put(&ticker("A"), 1.0, Utc::now());

        let settled = AtomicUsize::new(0);
        let results = service
            .resolve_all(&[ticker("A"), ticker("B"), ticker("A")], &|| {
                settled.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(results, vec![Ok(1.0), Ok(2.0), Ok(1.0)]);
        assert_eq!(settled.load(Ordering::SeqCst), 3);
        assert_eq!(provider.call_count(), 1);
    }
}
