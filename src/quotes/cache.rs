use crate::core::cache::KeyValueStore;
use crate::core::ticker::Ticker;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "stock_";

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    price: f64,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
}

/// Ticker to price cache with a freshness window.
///
/// Stale entries are kept and simply reported as misses. Storage failures and
/// corrupted records never reach callers; they read as misses.
pub struct PriceCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, ticker: &Ticker) -> Option<f64> {
        self.get_at(ticker, Utc::now())
    }

    /// Returns the cached price if it was stored less than one TTL before `now`.
    pub fn get_at(&self, ticker: &Ticker, now: DateTime<Utc>) -> Option<f64> {
        let entry = match self.read(ticker) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("Cache MISS for {}", ticker);
                return None;
            }
            Err(e) => {
                warn!("Error reading cache for {}: {}", ticker, e);
                return None;
            }
        };

        let age_ms = now.timestamp_millis().saturating_sub(entry.timestamp);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms < ttl_ms {
            debug!("Cache HIT for {} (age {}ms)", ticker, age_ms);
            Some(entry.price)
        } else {
            debug!("Cache entry stale for {} (age {}ms)", ticker, age_ms);
            None
        }
    }

    /// Overwrites the entry for `ticker`.
    pub fn put(&self, ticker: &Ticker, price: f64, fetched_at: DateTime<Utc>) {
        let entry = CacheEntry {
            price,
            timestamp: fetched_at.timestamp_millis(),
        };
        let res = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|value| self.store.set(&cache_key(ticker), &value));
        match res {
            Ok(()) => debug!("Cache PUT for {}: {}", ticker, price),
            Err(e) => warn!("Error writing cache for {}: {}", ticker, e),
        }
    }

    pub fn flush(&self) {
        if let Err(e) = self.store.flush() {
            warn!("Error flushing price cache: {e:#}");
        }
    }

    fn read(&self, ticker: &Ticker) -> Result<Option<CacheEntry>> {
        match self.store.get(&cache_key(ticker))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

fn cache_key(ticker: &Ticker) -> String {
    format!("{KEY_PREFIX}{ticker}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use anyhow::anyhow;

    const TTL: Duration = Duration::from_secs(15 * 60);

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn cache_with_store() -> (PriceCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PriceCache::new(store.clone(), TTL), store)
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("storage unavailable"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[test]
    fn test_freshness_boundary() {
        let (cache, _) = cache_with_store();
        let aapl = ticker("AAPL");
        let t0 = Utc::now();
        cache.put(&aapl, 150.25, t0);

        assert_eq!(cache.get_at(&aapl, t0), Some(150.25));
        let just_before = t0 + chrono::Duration::milliseconds(899_999);
        assert_eq!(cache.get_at(&aapl, just_before), Some(150.25));
        let at_ttl = t0 + chrono::Duration::milliseconds(900_000);
        assert_eq!(cache.get_at(&aapl, at_ttl), None);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let cache = PriceCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(u64::MAX));
        let aapl = ticker("AAPL");
        let t0 = Utc::now();
        cache.put(&aapl, 1.0, t0);

        let later = t0 + chrono::Duration::milliseconds(1);
        assert_eq!(cache.get_at(&aapl, later), Some(1.0));
        let much_later = t0 + chrono::Duration::days(365 * 100);
        assert_eq!(cache.get_at(&aapl, much_later), Some(1.0));
    }

    #[test]
    fn test_stale_entry_is_kept_and_overwritable() {
        let (cache, store) = cache_with_store();
        let aapl = ticker("AAPL");
        let t0 = Utc::now() - chrono::Duration::hours(1);
        cache.put(&aapl, 100.0, t0);

        assert_eq!(cache.get(&aapl), None);
        assert!(store.get("stock_AAPL").unwrap().is_some());

        cache.put(&aapl, 110.0, Utc::now());
        assert_eq!(cache.get(&aapl), Some(110.0));
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let (cache, _) = cache_with_store();
        let msft = ticker("MSFT");
        cache.put(&msft, 1.0, Utc::now());
        cache.put(&msft, 2.0, Utc::now());
        assert_eq!(cache.get(&msft), Some(2.0));
    }

    #[test]
    fn test_key_format_and_record_layout() {
        let (cache, store) = cache_with_store();
        let t0 = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        cache.put(&ticker("ibm"), 190.5, t0);

        let raw = store.get("stock_IBM").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["price"], 190.5);
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_malformed_record_is_a_miss() {
        let (cache, store) = cache_with_store();
        store.set("stock_AAPL", "{not json").unwrap();
        assert_eq!(cache.get(&ticker("AAPL")), None);

        store.set("stock_AAPL", r#"{"price":"abc"}"#).unwrap();
        assert_eq!(cache.get(&ticker("AAPL")), None);
    }

    #[test]
    fn test_storage_errors_are_swallowed() {
        let cache = PriceCache::new(Arc::new(FailingStore), TTL);
        let aapl = ticker("AAPL");
        cache.put(&aapl, 150.0, Utc::now());
        assert_eq!(cache.get(&aapl), None);
    }
}
