//! Background purge of expired mappings
//!
//! Expired mappings are already invisible to lookups; the sweeper only
//! reclaims their memory and snapshot space.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::AllocationService;
use crate::errors::Result;

pub struct ExpirySweeper {
    service: Arc<AllocationService>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(service: Arc<AllocationService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    pub async fn run_once(&self) -> Result<usize> {
        let purged = self.service.purge_expired().await?;
        if purged > 0 {
            info!("Deleted {} expired mappings", purged);
        } else {
            debug!("No expired mappings to delete");
        }
        Ok(purged)
    }

    /// Sweep now, then every `interval`
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("Error deleting expired mappings: {}", e);
                }
            }
        })
    }
}
