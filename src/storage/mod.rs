use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::errors::{Result, ShortmintError};

pub mod file;
pub mod memory;
pub mod models;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::Mapping;

/// Result of the atomic check-and-insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The mapping is now visible under both keys
    Inserted(Mapping),
    /// The code is bound to this live mapping; nothing changed
    CodeTaken(Mapping),
    /// A unique-URL insert found this live mapping for the URL; nothing changed
    UrlBound(Mapping),
}

/// Result of a conditional remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Mapping),
    NotFound,
    /// The code is bound to a different URL than expected; nothing changed
    Mismatch(Mapping),
}

/// Keyed mapping storage with two access paths kept consistent
///
/// Any moment a mapping is visible via one key it is visible via the
/// other. Expired mappings are never returned and count as absent.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Insert `mapping` unless its code is taken by a live mapping, or,
    /// when `unique_url` is set, its URL already has a live mapping
    async fn insert(&self, mapping: Mapping, unique_url: bool) -> Result<InsertOutcome>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Mapping>>;

    /// The oldest live mapping for `url`
    async fn get_by_url(&self, url: &str) -> Result<Option<Mapping>>;

    /// Remove the mapping under `code`, only if it points at `expected_url`
    /// when one is given
    async fn remove(&self, code: &str, expected_url: Option<&str>) -> Result<RemoveOutcome>;

    /// Drop every mapping expired at `now`, returning how many went away
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// All live mappings
    async fn load_all(&self) -> Result<Vec<Mapping>>;

    /// Number of live mappings
    async fn count(&self) -> Result<usize>;

    /// Persist pending changes, for backends that buffer them
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

pub struct StoreFactory;

impl StoreFactory {
    pub fn create(config: &StorageConfig) -> Result<Arc<dyn MappingStore>> {
        if config.shards == 0 {
            return Err(ShortmintError::config("storage.shards must be at least 1"));
        }

        match config.backend.to_lowercase().as_str() {
            "memory" => Ok(Arc::new(MemoryStore::new(config.shards))),
            "file" => Ok(Arc::new(FileStore::open(&config.file_path, config.shards)?)),
            other => Err(ShortmintError::config(format!(
                "Unknown storage backend '{}'. Valid: memory, file",
                other
            ))),
        }
    }
}
