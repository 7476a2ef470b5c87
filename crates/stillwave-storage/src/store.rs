//! Filesystem layout for audio artifacts.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Public URL prefix under which the store root is served.
pub const AUDIO_URL_PREFIX: &str = "/audio";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
}

impl StorageConfig {
    /// Load from environment. `AUDIO_STORE_ROOT` overrides the default
    /// `./data/audio`.
    pub fn from_env() -> Self {
        let root = std::env::var("AUDIO_STORE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/audio"));
        Self { root }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/audio"),
        }
    }
}

/// Local store for rendered audio.
///
/// Layout under the root:
/// - `chunks/`  per-unit renders keyed by content fingerprint
/// - `output/`  finished sessions and mixes
/// - `tmp/`     scratch files, moved into place once complete
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create the store and its directory layout.
    pub async fn init(config: &StorageConfig) -> StorageResult<Self> {
        let store = Self {
            root: config.root.clone(),
        };
        for dir in [store.chunks_dir(), store.output_dir(), store.tmp_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        info!(root = %store.root.display(), "Audio store initialized");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Path for a per-unit render, keyed by content fingerprint.
    pub fn chunk_path(&self, key: &str) -> PathBuf {
        self.chunks_dir().join(format!("{}.mp3", key))
    }

    /// Path for a finished session or mix.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir().join(format!("{}.mp3", name))
    }

    /// Fresh scratch path for an in-progress render.
    pub fn tmp_path(&self) -> PathBuf {
        self.tmp_dir().join(format!("{}.mp3", Uuid::new_v4()))
    }

    /// Best-effort removal of a staging file that will not be published.
    ///
    /// Callers use this on their error paths so an ffmpeg failure or a
    /// failed move never strands a partial render under `tmp/`.
    pub async fn discard_tmp(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to discard staging file");
            }
        }
    }

    /// Remove staging files older than `max_age`, returning how many were
    /// deleted. Anything still under `tmp/` past that age is an orphan
    /// from a crashed or interrupted render.
    pub fn sweep_tmp(&self, max_age: Duration) -> usize {
        let entries = match std::fs::read_dir(self.tmp_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to read tmp directory");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.elapsed().ok());
            let Some(age) = age else { continue };
            if age <= max_age {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove orphaned staging file");
                }
            }
        }
        removed
    }

    /// Public URL for a file inside the store.
    pub fn url_for(&self, path: &Path) -> StorageResult<String> {
        let rel = path.strip_prefix(&self.root).map_err(|_| {
            StorageError::invalid_path(format!("{} is outside the store", path.display()))
        })?;
        Ok(format!("{}/{}", AUDIO_URL_PREFIX, rel.display()))
    }

    /// Resolve a public URL back to a file on disk.
    ///
    /// Rejects anything that escapes the store root and reports missing
    /// files as `NotFound` so callers can surface a clean 404.
    pub fn resolve(&self, url: &str) -> StorageResult<PathBuf> {
        let rel = url
            .strip_prefix(AUDIO_URL_PREFIX)
            .map(|r| r.trim_start_matches('/'))
            .ok_or_else(|| StorageError::invalid_path(format!("not an audio URL: {}", url)))?;

        let rel_path = Path::new(rel);
        let safe = rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rel.is_empty() || !safe {
            return Err(StorageError::invalid_path(format!(
                "unsafe audio URL: {}",
                url
            )));
        }

        let path = self.root.join(rel_path);
        if !path.exists() {
            return Err(StorageError::not_found(url.to_string()));
        }
        Ok(path)
    }
}
