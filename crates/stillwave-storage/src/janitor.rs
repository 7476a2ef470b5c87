//! Background eviction for artifact caches and the staging area.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::info;

use crate::cache::ArtifactCache;
use crate::store::ArtifactStore;

/// Interval between staging-area sweeps.
const TMP_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Staging files older than this are orphans from interrupted renders;
/// a live render finishes in minutes.
const TMP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Periodic sweeper over the artifact caches and the store's `tmp/` area.
///
/// Each cache with a retention window gets its own sweep loop on a period
/// equal to that window. Caches without one are accepted but never touched,
/// so callers can register everything and let the janitor sort it out.
pub struct Janitor {
    store: ArtifactStore,
    caches: Vec<Arc<ArtifactCache>>,
    enabled: bool,
}

impl Janitor {
    pub fn new(store: ArtifactStore, caches: Vec<Arc<ArtifactCache>>) -> Self {
        let enabled = std::env::var("ENABLE_CACHE_JANITOR")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            store,
            caches,
            enabled,
        }
    }

    /// Run the sweep loops forever. Spawn this as a background task.
    pub async fn run(self) {
        if !self.enabled {
            info!("Cache janitor is disabled");
            return;
        }

        for cache in &self.caches {
            let Some(retention) = cache.retention() else {
                continue;
            };
            info!(cache = cache.name(), ?retention, "Starting cache sweep loop");

            let cache = Arc::clone(cache);
            tokio::spawn(async move {
                // tokio intervals panic on zero periods
                let mut ticker = interval(retention.max(Duration::from_secs(1)));
                loop {
                    ticker.tick().await;
                    cache.sweep(Utc::now());
                }
            });
        }

        info!(interval = ?TMP_SWEEP_INTERVAL, "Starting staging sweep loop");
        let mut ticker = interval(TMP_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            self.sweep_tmp_once();
        }
    }

    fn sweep_tmp_once(&self) -> usize {
        let removed = self.store.sweep_tmp(TMP_MAX_AGE);
        if removed > 0 {
            info!(removed, "Removed orphaned staging files");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tmp_sweep_spares_in_progress_renders() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::init(&StorageConfig {
            root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();

        let staging = store.tmp_path();
        tokio::fs::write(&staging, b"partial").await.unwrap();

        // Fresh staging files belong to renders still in flight
        let janitor = Janitor::new(store, vec![]);
        assert_eq!(janitor.sweep_tmp_once(), 0);
        assert!(staging.exists());
    }
}
