// crates/server/src/state.rs
//! Application state for the Axum server.

use agentdeck_core::{EnrichmentCache, Thresholds};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Root of the agent's storage tree (read-only from our side).
    pub storage_root: PathBuf,
    /// Busy/stale age cutoffs applied to every discovery call.
    pub thresholds: Thresholds,
    /// One enrichment cache per process lifetime. Behind an async mutex
    /// because discovery awaits file reads while holding it; concurrent
    /// polls serialize here and sets are last-writer-wins.
    pub cache: Mutex<EnrichmentCache>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(storage_root: PathBuf, thresholds: Thresholds) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            storage_root,
            thresholds,
            cache: Mutex::new(EnrichmentCache::default()),
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_new() {
        let state = AppState::new(PathBuf::from("/tmp/storage"), Thresholds::default());
        assert!(state.uptime_secs() < 1);
        assert_eq!(state.thresholds.busy_minutes, 5);
        assert!(state.cache.lock().await.is_empty());
    }
}
