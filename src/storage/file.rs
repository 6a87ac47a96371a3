//! JSON snapshot persistence over [`MemoryStore`]
//!
//! All reads and atomic operations are served from memory. Mutations mark
//! the store dirty; [`MappingStore::flush`] writes the full snapshot to a
//! temporary file and renames it over the target, so a crash mid-write
//! never leaves a truncated snapshot behind. Both indices are rebuilt from
//! the snapshot on open.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{InsertOutcome, Mapping, MappingStore, MemoryStore, RemoveOutcome};
use crate::errors::{Result, ShortmintError};

pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: AtomicBool,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the snapshot at `path`, creating an empty store if it is missing
    pub fn open<P: AsRef<Path>>(path: P, shards: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryStore::new(shards);

        let mappings = Self::read_snapshot(&path)?;
        let now = Utc::now();
        let mut loaded = 0;
        for mapping in mappings {
            if !mapping.is_live(now) {
                continue;
            }
            let code = mapping.short_code.clone();
            // Snapshots written by this store never contain duplicate codes
            match inner.insert_sync(mapping, false)? {
                InsertOutcome::Inserted(_) => loaded += 1,
                _ => warn!("Skipping duplicate code '{}' in snapshot", code),
            }
        }

        info!(
            "FileStore opened {}, loaded {} mappings",
            path.display(),
            loaded
        );

        Ok(Self {
            path,
            inner,
            dirty: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        })
    }

    fn read_snapshot(path: &Path) -> Result<Vec<Mapping>> {
        match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str::<Vec<Mapping>>(&content).map_err(|e| {
                error!("Failed to parse snapshot {}: {}", path.display(), e);
                ShortmintError::serialization(format!(
                    "Failed to parse snapshot {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Snapshot {} not found, starting empty", path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(ShortmintError::file_operation(format!(
                "Failed to read snapshot {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    #[inline]
    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_snapshot(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut mappings = self.inner.load_all().await?;
        mappings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let json = serde_json::to_vec_pretty(&mappings)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(
            "Snapshot of {} mappings written to {}",
            mappings.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl MappingStore for FileStore {
    async fn insert(&self, mapping: Mapping, unique_url: bool) -> Result<InsertOutcome> {
        let outcome = self.inner.insert(mapping, unique_url).await?;
        if matches!(outcome, InsertOutcome::Inserted(_)) {
            self.mark_dirty();
        }
        Ok(outcome)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Mapping>> {
        self.inner.get_by_code(code).await
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Mapping>> {
        self.inner.get_by_url(url).await
    }

    async fn remove(&self, code: &str, expected_url: Option<&str>) -> Result<RemoveOutcome> {
        let outcome = self.inner.remove(code, expected_url).await?;
        if matches!(outcome, RemoveOutcome::Removed(_)) {
            self.mark_dirty();
        }
        Ok(outcome)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let purged = self.inner.purge_expired(now).await?;
        if purged > 0 {
            self.mark_dirty();
        }
        Ok(purged)
    }

    async fn load_all(&self) -> Result<Vec<Mapping>> {
        self.inner.load_all().await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn flush(&self) -> Result<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.write_snapshot().await {
            // Keep the changes pending for the next flush
            self.mark_dirty();
            error!("Failed to write snapshot {}: {}", self.path.display(), e);
            return Err(e);
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
