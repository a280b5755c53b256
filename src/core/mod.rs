//! Core business logic abstractions

pub mod analytics;
pub mod cache;
pub mod config;
pub mod holding;
pub mod log;
pub mod price;
pub mod ticker;

// Re-export main types for cleaner imports
pub use holding::{Holding, HoldingDraft, HoldingStore};
pub use price::{PriceError, PriceProvider};
pub use ticker::Ticker;
