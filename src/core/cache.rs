//! Local key-value storage abstraction used by the price cache.

use anyhow::Result;

/// String keyed get/set with no transactional guarantees.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Makes previous writes durable. A no-op for volatile stores.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
