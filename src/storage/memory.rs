//! Sharded in-memory mapping store
//!
//! Every mapping lives in two indices: `by_code` in the shard its code
//! hashes to and `by_url` in the shard its URL hashes to. Mutations write
//! lock all the shards they touch, in ascending index order, and change
//! both indices before releasing any of them. Readers take a single read
//! lock, so they observe a mapping either fully present or fully absent.
//! Operations on keys in unrelated shards never contend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, trace};
use xxhash_rust::xxh64::xxh64;

use super::{InsertOutcome, Mapping, MappingStore, RemoveOutcome};
use crate::errors::{Result, ShortmintError};

/// Re-locks allowed when a key changes between peek and lock
const MAX_LOCK_RETRIES: usize = 8;

#[derive(Default)]
struct Shard {
    by_code: HashMap<String, Mapping>,
    /// Mappings per URL, oldest first
    by_url: HashMap<String, Vec<Mapping>>,
}

impl Shard {
    fn unlink_url(&mut self, url: &str, code: &str) {
        if let Some(list) = self.by_url.get_mut(url) {
            list.retain(|m| m.short_code != code);
            if list.is_empty() {
                self.by_url.remove(url);
            }
        }
    }

    fn live_for_url(&self, url: &str, now: DateTime<Utc>) -> Option<&Mapping> {
        self.by_url
            .get(url)
            .and_then(|list| list.iter().find(|m| m.is_live(now)))
    }
}

/// Write guards over a sorted, deduplicated set of shards
struct LockedShards<'a> {
    guards: Vec<(usize, RwLockWriteGuard<'a, Shard>)>,
}

impl LockedShards<'_> {
    fn shard(&mut self, idx: usize) -> &mut Shard {
        let pos = self
            .guards
            .binary_search_by_key(&idx, |(i, _)| *i)
            .unwrap_or_else(|_| panic!("shard {} used without being locked", idx));
        &mut self.guards[pos].1
    }
}

pub struct MemoryStore {
    shards: Box<[RwLock<Shard>]>,
}

impl MemoryStore {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(Shard::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        debug!("MemoryStore initialized with {} shards", shard_count);
        Self { shards }
    }

    #[inline]
    fn shard_index(&self, key: &str) -> usize {
        (xxh64(key.as_bytes(), 0) % self.shards.len() as u64) as usize
    }

    fn lock(&self, mut indices: Vec<usize>) -> LockedShards<'_> {
        indices.sort_unstable();
        indices.dedup();
        let guards = indices
            .into_iter()
            .map(|i| (i, self.shards[i].write()))
            .collect();
        LockedShards { guards }
    }

    /// Current entry under `code`, live or not
    fn peek(&self, code: &str) -> Option<Mapping> {
        self.shards[self.shard_index(code)]
            .read()
            .by_code
            .get(code)
            .cloned()
    }

    pub(crate) fn insert_sync(&self, mapping: Mapping, unique_url: bool) -> Result<InsertOutcome> {
        let code = mapping.short_code.clone();
        let url = mapping.original_url.clone();
        let code_idx = self.shard_index(&code);
        let url_idx = self.shard_index(&url);

        for _ in 0..MAX_LOCK_RETRIES {
            let now = Utc::now();
            // An expired entry under this code is evicted in the same critical
            // section, which also needs the shard of its URL.
            let stale = self.peek(&code).filter(|m| !m.is_live(now));
            let stale_idx = stale.as_ref().map(|m| self.shard_index(&m.original_url));

            let mut indices = vec![code_idx, url_idx];
            indices.extend(stale_idx);
            let mut locked = self.lock(indices);

            match locked.shard(code_idx).by_code.get(&code).cloned() {
                Some(existing) if existing.is_live(now) => {
                    return Ok(InsertOutcome::CodeTaken(existing));
                }
                Some(existing) => {
                    if stale.as_ref() != Some(&existing) {
                        trace!("Entry for '{}' changed before lock, retrying", code);
                        continue;
                    }
                    locked.shard(code_idx).by_code.remove(&code);
                    let existing_url_idx = self.shard_index(&existing.original_url);
                    locked
                        .shard(existing_url_idx)
                        .unlink_url(&existing.original_url, &code);
                    debug!("Evicted expired mapping '{}' on insert", code);
                }
                None => {}
            }

            if unique_url
                && let Some(bound) = locked.shard(url_idx).live_for_url(&url, now).cloned()
            {
                return Ok(InsertOutcome::UrlBound(bound));
            }

            locked
                .shard(code_idx)
                .by_code
                .insert(code.clone(), mapping.clone());
            locked
                .shard(url_idx)
                .by_url
                .entry(url)
                .or_default()
                .push(mapping.clone());
            return Ok(InsertOutcome::Inserted(mapping));
        }

        Err(ShortmintError::store_operation(format!(
            "Insert of '{}' kept racing concurrent writers",
            code
        )))
    }

    fn remove_sync(&self, code: &str, expected_url: Option<&str>) -> Result<RemoveOutcome> {
        let code_idx = self.shard_index(code);

        for _ in 0..MAX_LOCK_RETRIES {
            let Some(peeked) = self.peek(code) else {
                return Ok(RemoveOutcome::NotFound);
            };
            let url_idx = self.shard_index(&peeked.original_url);
            let mut locked = self.lock(vec![code_idx, url_idx]);

            let Some(current) = locked.shard(code_idx).by_code.get(code).cloned() else {
                return Ok(RemoveOutcome::NotFound);
            };
            if current != peeked {
                trace!("Entry for '{}' changed before lock, retrying", code);
                continue;
            }

            let live = current.is_live(Utc::now());
            if live
                && let Some(expected) = expected_url
                && current.original_url != expected
            {
                return Ok(RemoveOutcome::Mismatch(current));
            }

            locked.shard(code_idx).by_code.remove(code);
            locked
                .shard(url_idx)
                .unlink_url(&current.original_url, code);

            return Ok(if live {
                RemoveOutcome::Removed(current)
            } else {
                debug!("Evicted expired mapping '{}' on remove", code);
                RemoveOutcome::NotFound
            });
        }

        Err(ShortmintError::store_operation(format!(
            "Remove of '{}' kept racing concurrent writers",
            code
        )))
    }

    fn purge_sync(&self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;
        for shard in self.shards.iter() {
            let expired: Vec<Mapping> = shard
                .read()
                .by_code
                .values()
                .filter(|m| !m.is_live(now))
                .cloned()
                .collect();

            for mapping in expired {
                let code_idx = self.shard_index(&mapping.short_code);
                let url_idx = self.shard_index(&mapping.original_url);
                let mut locked = self.lock(vec![code_idx, url_idx]);

                // Re-inserted since the scan
                if locked.shard(code_idx).by_code.get(&mapping.short_code) != Some(&mapping) {
                    continue;
                }
                locked.shard(code_idx).by_code.remove(&mapping.short_code);
                locked
                    .shard(url_idx)
                    .unlink_url(&mapping.original_url, &mapping.short_code);
                purged += 1;
            }
        }
        purged
    }

    fn live_mappings(&self) -> Vec<Mapping> {
        let now = Utc::now();
        self.shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .by_code
                    .values()
                    .filter(|m| m.is_live(now))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Index disagreements, for tests: pairs present in one index only
    #[doc(hidden)]
    pub fn index_mismatches(&self) -> usize {
        let guards: Vec<_> = self.shards.iter().map(|s| s.read()).collect();
        let mut mismatches = 0;
        for guard in &guards {
            for (code, m) in &guard.by_code {
                let url_shard = &guards[self.shard_index(&m.original_url)];
                let listed = url_shard
                    .by_url
                    .get(&m.original_url)
                    .is_some_and(|list| list.iter().any(|x| &x.short_code == code));
                if !listed {
                    mismatches += 1;
                }
            }
            for list in guard.by_url.values() {
                for m in list {
                    let code_shard = &guards[self.shard_index(&m.short_code)];
                    if code_shard.by_code.get(&m.short_code) != Some(m) {
                        mismatches += 1;
                    }
                }
            }
        }
        mismatches
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn insert(&self, mapping: Mapping, unique_url: bool) -> Result<InsertOutcome> {
        self.insert_sync(mapping, unique_url)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Mapping>> {
        let now = Utc::now();
        Ok(self.shards[self.shard_index(code)]
            .read()
            .by_code
            .get(code)
            .filter(|m| m.is_live(now))
            .cloned())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Mapping>> {
        let now = Utc::now();
        Ok(self.shards[self.shard_index(url)]
            .read()
            .live_for_url(url, now)
            .cloned())
    }

    async fn remove(&self, code: &str, expected_url: Option<&str>) -> Result<RemoveOutcome> {
        self.remove_sync(code, expected_url)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        Ok(self.purge_sync(now))
    }

    async fn load_all(&self) -> Result<Vec<Mapping>> {
        Ok(self.live_mappings())
    }

    async fn count(&self) -> Result<usize> {
        let now = Utc::now();
        Ok(self
            .shards
            .iter()
            .map(|s| s.read().by_code.values().filter(|m| m.is_live(now)).count())
            .sum())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn expired(code: &str, url: &str) -> Mapping {
        Mapping::new(code, url).with_expires_at(Some(Utc::now() - Duration::seconds(1)))
    }

    #[tokio::test]
    async fn test_insert_then_lookup_both_keys() {
        let store = MemoryStore::new(4);
        let m = Mapping::new("abc", "https://example.com");
        assert_eq!(
            store.insert(m.clone(), true).await.unwrap(),
            InsertOutcome::Inserted(m.clone())
        );
        assert_eq!(store.get_by_code("abc").await.unwrap(), Some(m.clone()));
        assert_eq!(
            store.get_by_url("https://example.com").await.unwrap(),
            Some(m)
        );
        assert_eq!(store.index_mismatches(), 0);
    }

    #[tokio::test]
    async fn test_code_taken_leaves_store_unchanged() {
        let store = MemoryStore::new(4);
        let first = Mapping::new("abc", "https://a.example");
        store.insert(first.clone(), false).await.unwrap();

        let outcome = store
            .insert(Mapping::new("abc", "https://b.example"), false)
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::CodeTaken(first));
        assert_eq!(store.get_by_url("https://b.example").await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unique_url_reports_bound_mapping() {
        let store = MemoryStore::new(4);
        let first = Mapping::new("one", "https://example.com");
        store.insert(first.clone(), true).await.unwrap();

        let outcome = store
            .insert(Mapping::new("two", "https://example.com"), true)
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::UrlBound(first));
        assert_eq!(store.get_by_code("two").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_urls_allowed_without_unique_flag() {
        let store = MemoryStore::new(4);
        let first = Mapping::new("one", "https://example.com");
        store.insert(first.clone(), false).await.unwrap();
        store
            .insert(Mapping::new("two", "https://example.com"), false)
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        // oldest wins
        assert_eq!(
            store.get_by_url("https://example.com").await.unwrap(),
            Some(first)
        );

        store.remove("one", None).await.unwrap();
        assert_eq!(
            store
                .get_by_url("https://example.com")
                .await
                .unwrap()
                .map(|m| m.short_code),
            Some("two".to_string())
        );
        assert_eq!(store.index_mismatches(), 0);
    }

    #[tokio::test]
    async fn test_remove_clears_both_indices() {
        let store = MemoryStore::new(4);
        let m = Mapping::new("abc", "https://example.com");
        store.insert(m.clone(), true).await.unwrap();

        assert_eq!(
            store.remove("abc", None).await.unwrap(),
            RemoveOutcome::Removed(m)
        );
        assert_eq!(store.get_by_code("abc").await.unwrap(), None);
        assert_eq!(store.get_by_url("https://example.com").await.unwrap(), None);
        assert_eq!(
            store.remove("abc", None).await.unwrap(),
            RemoveOutcome::NotFound
        );
        assert_eq!(store.index_mismatches(), 0);
    }

    #[tokio::test]
    async fn test_conditional_remove_mismatch() {
        let store = MemoryStore::new(4);
        let m = Mapping::new("abc", "https://example.com");
        store.insert(m.clone(), true).await.unwrap();

        assert_eq!(
            store
                .remove("abc", Some("https://other.example"))
                .await
                .unwrap(),
            RemoveOutcome::Mismatch(m.clone())
        );
        assert_eq!(store.get_by_code("abc").await.unwrap(), Some(m));
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible_and_replaceable() {
        let store = MemoryStore::new(4);
        store
            .insert(expired("abc", "https://old.example"), true)
            .await
            .unwrap();
        assert_eq!(store.get_by_code("abc").await.unwrap(), None);
        assert_eq!(store.get_by_url("https://old.example").await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), 0);

        let fresh = Mapping::new("abc", "https://new.example");
        assert_eq!(
            store.insert(fresh.clone(), true).await.unwrap(),
            InsertOutcome::Inserted(fresh)
        );
        assert_eq!(store.index_mismatches(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new(4);
        store
            .insert(expired("old1", "https://a.example"), false)
            .await
            .unwrap();
        store
            .insert(expired("old2", "https://b.example"), false)
            .await
            .unwrap();
        store
            .insert(Mapping::new("live", "https://c.example"), false)
            .await
            .unwrap();

        assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 2);
        assert_eq!(store.purge_expired(Utc::now()).await.unwrap(), 0);
        assert_eq!(store.load_all().await.unwrap().len(), 1);
        assert_eq!(store.index_mismatches(), 0);
    }

    #[test]
    fn test_single_shard_store() {
        let store = MemoryStore::new(0);
        assert_eq!(store.shards.len(), 1);
        store
            .insert_sync(Mapping::new("a", "https://example.com"), true)
            .unwrap();
        assert_eq!(store.index_mismatches(), 0);
    }
}
