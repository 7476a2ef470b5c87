//! Fingerprint-keyed artifact caches with optional time-based eviction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    path: PathBuf,
    created_at: DateTime<Utc>,
}

/// Outcome of one eviction sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepStats {
    pub evicted: usize,
    pub remaining: usize,
    pub files_removed: usize,
}

/// Maps content fingerprints to audio files already on disk.
///
/// Entries older than the retention window are evicted by [`sweep`], files
/// included. A cache with no retention keeps entries for the process
/// lifetime; silence beds use that mode since a pause's duration fully
/// determines its content and the handful of distinct durations stays tiny.
///
/// Two requests racing on the same fingerprint may both render and write
/// the same artifact. The writes target the same keyed path so the last
/// one wins, which is harmless for content-addressed files.
///
/// [`sweep`]: ArtifactCache::sweep
pub struct ArtifactCache {
    name: &'static str,
    retention: Option<Duration>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ArtifactCache {
    pub fn new(name: &'static str, retention: Option<Duration>) -> Self {
        Self {
            name,
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fingerprint. Entries whose backing file has disappeared
    /// are pruned and reported as a miss.
    pub fn get(&self, key: &str) -> Option<PathBuf> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.path.exists() => {
                debug!(cache = self.name, key, "Cache hit");
                Some(entry.path.clone())
            }
            Some(_) => {
                warn!(cache = self.name, key, "Cached file missing on disk, pruning");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, path: PathBuf) {
        let key = key.into();
        debug!(cache = self.name, key = %key, path = %path.display(), "Cache insert");
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            CacheEntry {
                path,
                created_at: Utc::now(),
            },
        );
    }

    /// Evict entries older than the retention window as of `now`, deleting
    /// their files. A no-op for caches without retention.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepStats {
        let Some(retention) = self.retention else {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            return SweepStats {
                remaining: entries.len(),
                ..SweepStats::default()
            };
        };

        let cutoff = now
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(24));

        let expired: Vec<(String, CacheEntry)> = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            let expired_keys: Vec<String> = entries
                .iter()
                .filter(|(_, e)| e.created_at < cutoff)
                .map(|(k, _)| k.clone())
                .collect();
            expired_keys
                .into_iter()
                .filter_map(|k| entries.remove(&k).map(|e| (k, e)))
                .collect()
        };

        let mut stats = SweepStats {
            evicted: expired.len(),
            remaining: self.len(),
            files_removed: 0,
        };

        for (key, entry) in expired {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => stats.files_removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(cache = self.name, key = %key, error = %e, "Failed to remove evicted file");
                }
            }
        }

        if stats.evicted > 0 {
            info!(
                cache = self.name,
                evicted = stats.evicted,
                remaining = stats.remaining,
                "Cache sweep complete"
            );
        }
        stats
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, age: Duration) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.created_at = Utc::now() - chrono::Duration::from_std(age).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_get_after_put() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, b"x").unwrap();

        let cache = ArtifactCache::new("test", Some(DAY));
        assert!(cache.get("k1").is_none());
        cache.put("k1", file.clone());
        assert_eq!(cache.get("k1"), Some(file));
    }

    #[test]
    fn test_missing_file_is_a_miss_and_pruned() {
        let cache = ArtifactCache::new("test", Some(DAY));
        cache.put("k1", PathBuf::from("/nope/gone.mp3"));
        assert!(cache.get("k1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_evicts_only_expired_entries() {
        let dir = TempDir::new().unwrap();
        let old_file = dir.path().join("old.mp3");
        let new_file = dir.path().join("new.mp3");
        std::fs::write(&old_file, b"x").unwrap();
        std::fs::write(&new_file, b"x").unwrap();

        let cache = ArtifactCache::new("test", Some(DAY));
        cache.put("old", old_file.clone());
        cache.put("new", new_file.clone());
        cache.backdate("old", DAY + Duration::from_secs(60));

        let stats = cache.sweep(Utc::now());
        assert_eq!(stats.evicted, 1);
        assert_eq!(stats.files_removed, 1);
        assert_eq!(stats.remaining, 1);
        assert!(!old_file.exists());
        assert!(new_file.exists());
        assert!(cache.get("new").is_some());
    }

    #[test]
    fn test_no_retention_never_evicts() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("s.mp3");
        std::fs::write(&file, b"x").unwrap();

        let cache = ArtifactCache::new("silence", None);
        cache.put("silence_2.0", file.clone());
        cache.backdate("silence_2.0", DAY * 30);

        let stats = cache.sweep(Utc::now());
        assert_eq!(stats.evicted, 0);
        assert!(file.exists());
        assert!(cache.get("silence_2.0").is_some());
    }
}
