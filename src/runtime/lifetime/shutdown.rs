use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::MappingStore;

const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Resolve once Ctrl-C arrives
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, draining requests...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// Wait for `drain` (in-flight requests finishing), then flush the store
///
/// The flush must come last: anything written while draining has to be in
/// the final snapshot.
pub async fn drain_then_flush<F>(drain: F, store: Arc<dyn MappingStore>)
where
    F: Future<Output = ()>,
{
    drain.await;
    perform_shutdown_tasks(store).await;
}

/// Flush the store, giving up after the shutdown timeout
pub async fn perform_shutdown_tasks(store: Arc<dyn MappingStore>) {
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), store.flush()).await {
        Ok(Ok(())) => {
            info!("All shutdown tasks completed successfully");
        }
        Ok(Err(e)) => {
            error!("Failed to flush store on shutdown: {}", e);
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds",
                SHUTDOWN_TIMEOUT_SECS
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, Mapping};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_writes_during_drain_survive_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");

        {
            let store: Arc<dyn MappingStore> = Arc::new(FileStore::open(&path, 4).unwrap());
            store
                .insert(Mapping::new("before", "https://before.example"), true)
                .await
                .unwrap();

            // An in-flight request completing after stop was requested
            let in_flight = store.clone();
            let drain = async move {
                in_flight
                    .insert(Mapping::new("during", "https://during.example"), true)
                    .await
                    .unwrap();
            };
            drain_then_flush(drain, store).await;
        }

        let reopened = FileStore::open(&path, 4).unwrap();
        assert!(reopened.get_by_code("before").await.unwrap().is_some());
        assert!(reopened.get_by_code("during").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_flush_on_memory_store_is_noop() {
        let store: Arc<dyn MappingStore> = Arc::new(crate::storage::MemoryStore::new(2));
        drain_then_flush(async {}, store.clone()).await;
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
