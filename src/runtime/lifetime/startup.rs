use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::RedirectCache;
use crate::config::StaticConfig;
use crate::errors::ShortmintError;
use crate::generator::GeneratorFactory;
use crate::services::{AllocationPolicy, AllocationService, ExpirySweeper};
use crate::storage::{MappingStore, StoreFactory};

pub struct StartupContext {
    pub store: Arc<dyn MappingStore>,
    pub service: Arc<AllocationService>,
    pub background_tasks: Vec<JoinHandle<()>>,
}

/// Build the store, generator, cache and service, then start the
/// background sweeper and flusher
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StoreFactory::create(&config.storage).context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {} ({} mappings)",
        store.backend_name(),
        store.count().await.context("Failed to count mappings")?
    );

    check_code_length(config)?;
    let generator =
        GeneratorFactory::create(&config.generator).context("Failed to create code generator")?;
    info!(
        "Using {} code generator, length {}",
        generator.name(),
        config.generator.code_length
    );

    let cache = Arc::new(RedirectCache::new(&config.cache));
    let service = Arc::new(AllocationService::new(
        store.clone(),
        generator,
        cache,
        AllocationPolicy::from(&config.allocation),
    ));

    let mut background_tasks = Vec::new();

    if config.allocation.default_ttl_secs > 0 && config.allocation.sweep_interval_secs > 0 {
        let sweeper = ExpirySweeper::new(
            service.clone(),
            Duration::from_secs(config.allocation.sweep_interval_secs),
        );
        background_tasks.push(sweeper.spawn());
        info!(
            "Expiry sweeper started, interval: {}s",
            config.allocation.sweep_interval_secs
        );
    }

    if store.backend_name() == "file" && config.storage.flush_interval_secs > 0 {
        background_tasks.push(spawn_flusher(
            store.clone(),
            Duration::from_secs(config.storage.flush_interval_secs),
        ));
        info!(
            "Snapshot flusher started, interval: {}s",
            config.storage.flush_interval_secs
        );
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        store,
        service,
        background_tasks,
    })
}

/// Generated codes must stay within what the redirect route accepts
fn check_code_length(config: &StaticConfig) -> Result<()> {
    if config.generator.code_length > config.allocation.max_alias_length {
        return Err(ShortmintError::config(format!(
            "generator.code_length ({}) exceeds allocation.max_alias_length ({})",
            config.generator.code_length, config.allocation.max_alias_length
        ))
        .into());
    }
    Ok(())
}

/// Periodically persist buffered store changes
fn spawn_flusher(store: Arc<dyn MappingStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; nothing to flush yet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = store.flush().await {
                error!("Periodic flush failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CreateRequest;
    use crate::storage::FileStore;

    #[tokio::test]
    async fn test_prepare_memory_backend() {
        let config = StaticConfig::default();
        let ctx = prepare_server_startup(&config).await.unwrap();
        assert_eq!(ctx.store.backend_name(), "memory");

        let mapping = ctx
            .service
            .create(CreateRequest::new("https://example.com"))
            .await
            .unwrap();
        assert_eq!(ctx.store.count().await.unwrap(), 1);
        assert_eq!(
            ctx.service.resolve(&mapping.short_code).await.unwrap(),
            mapping
        );

        for task in ctx.background_tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_prepare_rejects_unknown_strategy() {
        let mut config = StaticConfig::default();
        config.generator.strategy = "nope".to_string();
        assert!(prepare_server_startup(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_prepare_rejects_code_longer_than_alias_limit() {
        let mut config = StaticConfig::default();
        config.generator.code_length = 70;
        config.allocation.max_alias_length = 64;
        let err = prepare_server_startup(&config).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ShortmintError>(),
            Some(ShortmintError::Config(_))
        ));

        config.generator.code_length = 64;
        let ctx = prepare_server_startup(&config).await.unwrap();
        for task in ctx.background_tasks {
            task.abort();
        }
    }

    #[tokio::test]
    async fn test_flusher_persists_changes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        let store: Arc<dyn MappingStore> = Arc::new(FileStore::open(&path, 4).unwrap());
        store
            .insert(
                crate::storage::Mapping::new("abc", "https://example.com"),
                true,
            )
            .await
            .unwrap();

        let handle = spawn_flusher(store.clone(), Duration::from_millis(20));
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(path.exists());
    }
}
