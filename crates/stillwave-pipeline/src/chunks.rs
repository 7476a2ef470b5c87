//! Per-unit synthesis with fingerprint caching.
//!
//! Each speech unit renders to `chunks/<fingerprint>.mp3` and each pause
//! to `chunks/silence_<seconds>.mp3`. A unit whose file already exists is
//! never synthesized again, so re-generating a script only pays for the
//! sentences that changed.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use stillwave_media::{move_file, render_silence};
use stillwave_models::{chunk_fingerprint, silence_key, ScriptUnit, TtsModel, Voice};
use stillwave_storage::{ArtifactCache, ArtifactStore};
use stillwave_tts::TtsClient;

use crate::error::{PipelineError, PipelineResult};

/// A rendered unit on disk.
#[derive(Debug, Clone)]
pub struct ChunkArtifact {
    pub path: PathBuf,
    /// True when the unit was served from cache instead of rendered.
    pub cached: bool,
}

/// Synthesis seam for the coordinator.
#[async_trait]
pub trait UnitSynthesizer: Send + Sync {
    async fn synthesize_unit(
        &self,
        unit: &ScriptUnit,
        voice: Voice,
        model: TtsModel,
    ) -> PipelineResult<ChunkArtifact>;
}

/// Production synthesizer backed by the speech API and ffmpeg.
pub struct ChunkSynthesizer {
    tts: TtsClient,
    store: ArtifactStore,
    chunk_cache: Arc<ArtifactCache>,
    silence_cache: Arc<ArtifactCache>,
}

impl ChunkSynthesizer {
    pub fn new(
        tts: TtsClient,
        store: ArtifactStore,
        chunk_cache: Arc<ArtifactCache>,
        silence_cache: Arc<ArtifactCache>,
    ) -> Self {
        Self {
            tts,
            store,
            chunk_cache,
            silence_cache,
        }
    }

    /// Cache lookup in two steps: the in-memory map first, then the keyed
    /// path on disk. A disk hit after a map miss happens after restarts,
    /// the entry is re-registered so the next lookup is cheap.
    fn lookup(&self, cache: &ArtifactCache, key: &str) -> Option<PathBuf> {
        if let Some(path) = cache.get(key) {
            return Some(path);
        }
        let path = self.store.chunk_path(key);
        if path.exists() {
            debug!(key, "Found existing chunk on disk, re-registering");
            cache.put(key, path.clone());
            return Some(path);
        }
        None
    }

    async fn speech_chunk(
        &self,
        text: &str,
        voice: Voice,
        model: TtsModel,
    ) -> PipelineResult<ChunkArtifact> {
        let key = chunk_fingerprint(text, voice, model);

        if let Some(path) = self.lookup(&self.chunk_cache, &key) {
            return Ok(ChunkArtifact { path, cached: true });
        }

        let audio = self.tts.synthesize(text, voice, model).await?;

        // Stage in tmp so a crash mid-write never leaves a truncated chunk
        // at a fingerprint the cache would trust
        let staging = self.store.tmp_path();
        if let Err(e) = tokio::fs::write(&staging, &audio).await {
            self.store.discard_tmp(&staging).await;
            return Err(e.into());
        }

        let path = self.store.chunk_path(&key);
        if let Err(e) = move_file(&staging, &path).await {
            self.store.discard_tmp(&staging).await;
            return Err(e.into());
        }
        self.chunk_cache.put(key, path.clone());

        info!(bytes = audio.len(), chars = text.len(), "Rendered speech chunk");
        Ok(ChunkArtifact { path, cached: false })
    }

    async fn silence_chunk(&self, seconds: u32) -> PipelineResult<ChunkArtifact> {
        let key = silence_key(seconds as f64);

        if let Some(path) = self.lookup(&self.silence_cache, &key) {
            return Ok(ChunkArtifact { path, cached: true });
        }

        let staging = self.store.tmp_path();
        if let Err(e) = render_silence(seconds as f64, &staging).await {
            self.store.discard_tmp(&staging).await;
            return Err(PipelineError::silence(format!(
                "{} second pause: {}",
                seconds, e
            )));
        }

        let path = self.store.chunk_path(&key);
        if let Err(e) = move_file(&staging, &path).await {
            self.store.discard_tmp(&staging).await;
            return Err(e.into());
        }
        self.silence_cache.put(key, path.clone());

        info!(seconds, "Rendered silence chunk");
        Ok(ChunkArtifact { path, cached: false })
    }
}

#[async_trait]
impl UnitSynthesizer for ChunkSynthesizer {
    async fn synthesize_unit(
        &self,
        unit: &ScriptUnit,
        voice: Voice,
        model: TtsModel,
    ) -> PipelineResult<ChunkArtifact> {
        match unit {
            ScriptUnit::Speech { text } => self.speech_chunk(text, voice, model).await,
            ScriptUnit::Silence { seconds } => self.silence_chunk(*seconds).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stillwave_storage::StorageConfig;
    use stillwave_tts::TtsConfig;
    use tempfile::TempDir;

    async fn synthesizer_in(dir: &TempDir) -> ChunkSynthesizer {
        let store = ArtifactStore::init(&StorageConfig {
            root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();

        // Unroutable endpoint: any test that actually dials out fails fast
        let tts = TtsClient::new(
            TtsConfig::new("sk-test").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        ChunkSynthesizer::new(
            tts,
            store,
            Arc::new(ArtifactCache::new("chunks", None)),
            Arc::new(ArtifactCache::new("silence", None)),
        )
    }

    #[tokio::test]
    async fn test_existing_speech_chunk_skips_synthesis() {
        let dir = TempDir::new().unwrap();
        let synth = synthesizer_in(&dir).await;

        let key = chunk_fingerprint("Breathe in.", Voice::Nova, TtsModel::Tts1);
        let path = synth.store.chunk_path(&key);
        tokio::fs::write(&path, b"mp3").await.unwrap();

        let unit = ScriptUnit::speech("Breathe in.");
        let artifact = synth
            .synthesize_unit(&unit, Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap();

        assert!(artifact.cached);
        assert_eq!(artifact.path, path);
    }

    #[tokio::test]
    async fn test_existing_silence_chunk_skips_render() {
        let dir = TempDir::new().unwrap();
        let synth = synthesizer_in(&dir).await;

        let path = synth.store.chunk_path("silence_4.0");
        tokio::fs::write(&path, b"mp3").await.unwrap();

        let artifact = synth
            .synthesize_unit(&ScriptUnit::silence(4), Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap();

        assert!(artifact.cached);
        assert_eq!(artifact.path, path);
    }

    #[tokio::test]
    async fn test_failed_silence_render_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        let synth = synthesizer_in(&dir).await;

        let err = synth
            .synthesize_unit(&ScriptUnit::silence(0), Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SilenceGeneration(_)));

        let leftover = std::fs::read_dir(synth.store.tmp_dir()).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_voice_change_misses_the_cache() {
        let dir = TempDir::new().unwrap();
        let synth = synthesizer_in(&dir).await;

        let key = chunk_fingerprint("Breathe in.", Voice::Nova, TtsModel::Tts1);
        tokio::fs::write(synth.store.chunk_path(&key), b"mp3")
            .await
            .unwrap();

        // Same text, different voice: must attempt synthesis and fail on
        // the unroutable endpoint
        let unit = ScriptUnit::speech("Breathe in.");
        let result = synth
            .synthesize_unit(&unit, Voice::Onyx, TtsModel::Tts1)
            .await;
        assert!(result.is_err());
    }
}
