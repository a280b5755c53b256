//! Price acquisition: freshness cache, serialized upstream fetcher and the
//! facade the rest of the application uses.

pub mod cache;
pub mod fetcher;
pub mod service;

pub use cache::PriceCache;
pub use fetcher::{FetcherOptions, RateLimitedFetcher};
pub use service::{PriceService, with_fallback};
