//! Redirect resolution cache
//!
//! A bounded moka cache keyed by short code. Entries never outlive the
//! mapping's own `expires_at`. Deletions bump an epoch counter before
//! invalidating, and a fill that observes a newer epoch than the one read
//! before its store lookup drops its own entry again, so a resolution
//! racing a delete cannot resurrect the deleted mapping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::policy::Expiry;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::storage::Mapping;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult {
    Found(Mapping),
    Miss,
}

/// Expiry derived from `Mapping::expires_at`, capped by the default TTL
struct MappingExpiry {
    default_ttl: Duration,
}

impl Expiry<String, Mapping> for MappingExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Mapping,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value.expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - chrono::Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                Some(remaining.min(self.default_ttl))
            }
            None => Some(self.default_ttl),
        }
    }
}

pub struct RedirectCache {
    inner: Option<Cache<String, Mapping>>,
    epoch: AtomicU64,
}

impl RedirectCache {
    pub fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            debug!("Redirect cache disabled");
            return Self::disabled();
        }

        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(MappingExpiry {
                default_ttl: Duration::from_secs(config.ttl_secs),
            })
            .build();

        debug!(
            "Redirect cache initialized with max capacity: {}, TTL: {}s",
            config.max_capacity, config.ttl_secs
        );
        Self {
            inner: Some(inner),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self {
            inner: None,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Read before the store lookup whose result is passed to [`Self::fill`]
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn get(&self, code: &str) -> CacheResult {
        let Some(inner) = &self.inner else {
            return CacheResult::Miss;
        };
        match inner.get(code).await {
            Some(mapping) => {
                trace!("Redirect cache hit for '{}'", code);
                CacheResult::Found(mapping)
            }
            None => CacheResult::Miss,
        }
    }

    /// Cache `mapping` unless a delete ran since `observed_epoch`
    pub async fn fill(&self, mapping: Mapping, observed_epoch: u64) {
        let Some(inner) = &self.inner else {
            return;
        };
        if !mapping.is_live(chrono::Utc::now()) {
            return;
        }
        let code = mapping.short_code.clone();
        inner.insert(code.clone(), mapping).await;
        if self.epoch.load(Ordering::SeqCst) != observed_epoch {
            trace!("Delete raced fill of '{}', dropping entry", code);
            inner.invalidate(&code).await;
        }
    }

    /// Called after the mapping is gone from the store
    pub async fn invalidate(&self, code: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(inner) = &self.inner {
            inner.invalidate(code).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> RedirectCache {
        RedirectCache::new(&CacheConfig {
            enabled: true,
            max_capacity: 100,
            ttl_secs: 60,
        })
    }

    #[tokio::test]
    async fn test_fill_then_hit() {
        let cache = enabled();
        let m = Mapping::new("abc", "https://example.com");
        cache.fill(m.clone(), cache.epoch()).await;
        assert_eq!(cache.get("abc").await, CacheResult::Found(m));
        assert_eq!(cache.get("zzz").await, CacheResult::Miss);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = enabled();
        cache
            .fill(Mapping::new("abc", "https://example.com"), cache.epoch())
            .await;
        cache.invalidate("abc").await;
        assert_eq!(cache.get("abc").await, CacheResult::Miss);
    }

    #[tokio::test]
    async fn test_stale_fill_after_delete_is_dropped() {
        let cache = enabled();
        // resolution reads the epoch, then a delete completes before the fill
        let observed = cache.epoch();
        cache.invalidate("abc").await;
        cache
            .fill(Mapping::new("abc", "https://example.com"), observed)
            .await;
        assert_eq!(cache.get("abc").await, CacheResult::Miss);
    }

    #[tokio::test]
    async fn test_expired_mapping_not_served() {
        let cache = enabled();
        let m = Mapping::new("abc", "https://example.com")
            .with_expires_at(Some(chrono::Utc::now() - chrono::Duration::seconds(5)));
        cache.fill(m, cache.epoch()).await;
        assert_eq!(cache.get("abc").await, CacheResult::Miss);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = RedirectCache::new(&CacheConfig {
            enabled: false,
            max_capacity: 100,
            ttl_secs: 60,
        });
        assert!(!cache.is_enabled());
        cache
            .fill(Mapping::new("abc", "https://example.com"), cache.epoch())
            .await;
        assert_eq!(cache.get("abc").await, CacheResult::Miss);
    }
}
