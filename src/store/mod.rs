pub mod disk;
pub mod memory;

use crate::core::cache::KeyValueStore;
use crate::core::config::AppConfig;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::warn;

/// Opens the local store for cached prices.
///
/// A persistent store lives under `<data_path>/cache`. If it cannot be opened
/// (another process holds it, unwritable directory) the cache degrades to memory.
pub fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    if !config.cache.persist {
        return Arc::new(MemoryStore::new());
    }

    let opened = config
        .default_data_path()
        .and_then(|path| DiskStore::open(&path.join("cache")));
    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Falling back to in-memory price cache: {e:#}");
            Arc::new(MemoryStore::new())
        }
    }
}
