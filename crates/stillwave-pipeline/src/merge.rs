//! Background music mixing with result caching.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use stillwave_media::{get_duration, mix_audio, move_file, MixParams};
use stillwave_models::mix_fingerprint;
use stillwave_storage::{ArtifactCache, ArtifactStore, StorageError};

use crate::error::{PipelineError, PipelineResult};

/// Result of one mix, with cache accounting for the response.
#[derive(Debug, Clone)]
pub struct MixOutcome {
    pub mixed_audio_url: String,
    pub merge_time_seconds: f64,
    pub cached: bool,
}

/// Overlays a looping music bed under a finished session.
pub struct MusicMixer {
    store: ArtifactStore,
    mix_cache: Arc<ArtifactCache>,
}

impl MusicMixer {
    pub fn new(store: ArtifactStore, mix_cache: Arc<ArtifactCache>) -> Self {
        Self { store, mix_cache }
    }

    pub async fn mix_with_music(
        &self,
        speech_url: &str,
        music_url: &str,
        speech_volume: f64,
        music_volume: f64,
    ) -> PipelineResult<MixOutcome> {
        let started = Instant::now();
        let key = mix_fingerprint(speech_url, music_url, music_volume);

        if let Some(path) = self.mix_cache.get(&key) {
            return Ok(MixOutcome {
                mixed_audio_url: self.store.url_for(&path)?,
                merge_time_seconds: started.elapsed().as_secs_f64(),
                cached: true,
            });
        }

        let speech = self.resolve(speech_url)?;
        let music = self.resolve(music_url)?;

        let duration = get_duration(&speech).await?;

        let staging = self.store.tmp_path();
        let mixed = mix_audio(
            &speech,
            &music,
            &staging,
            MixParams {
                speech_volume,
                music_volume,
                duration,
            },
        )
        .await;
        if let Err(e) = mixed {
            self.store.discard_tmp(&staging).await;
            return Err(PipelineError::mix(e.to_string()));
        }

        let output = self.store.output_path(&format!("mixed_{}", Uuid::new_v4()));
        if let Err(e) = move_file(&staging, &output).await {
            self.store.discard_tmp(&staging).await;
            return Err(e.into());
        }
        self.mix_cache.put(key, output.clone());

        let merge_time_seconds = started.elapsed().as_secs_f64();
        info!(
            speech_url,
            music_url,
            duration,
            elapsed = merge_time_seconds,
            "Mix complete"
        );

        Ok(MixOutcome {
            mixed_audio_url: self.store.url_for(&output)?,
            merge_time_seconds,
            cached: false,
        })
    }

    fn resolve(&self, url: &str) -> PipelineResult<std::path::PathBuf> {
        self.store.resolve(url).map_err(|e| match e {
            StorageError::NotFound(key) => PipelineError::not_found(key),
            other => other.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stillwave_storage::StorageConfig;
    use tempfile::TempDir;

    async fn mixer_in(dir: &TempDir) -> MusicMixer {
        let store = ArtifactStore::init(&StorageConfig {
            root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();
        MusicMixer::new(store, Arc::new(ArtifactCache::new("mixes", None)))
    }

    #[tokio::test]
    async fn test_missing_speech_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mixer = mixer_in(&dir).await;

        let err = mixer
            .mix_with_music("/audio/output/ghost.mp3", "/audio/output/bed.mp3", 1.0, 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cached_mix_short_circuits() {
        let dir = TempDir::new().unwrap();
        let mixer = mixer_in(&dir).await;

        let existing = mixer.store.output_path("mixed_earlier");
        tokio::fs::write(&existing, b"mp3").await.unwrap();

        let key = mix_fingerprint("/audio/output/a.mp3", "/audio/output/b.mp3", 0.3);
        mixer.mix_cache.put(key, existing.clone());

        // Neither input exists on disk; the cache hit never touches them
        let outcome = mixer
            .mix_with_music("/audio/output/a.mp3", "/audio/output/b.mp3", 1.0, 0.3)
            .await
            .unwrap();

        assert!(outcome.cached);
        assert_eq!(outcome.mixed_audio_url, "/audio/output/mixed_earlier.mp3");
    }

    #[tokio::test]
    async fn test_speech_volume_does_not_change_the_cache_key() {
        let dir = TempDir::new().unwrap();
        let mixer = mixer_in(&dir).await;

        let existing = mixer.store.output_path("mixed_earlier");
        tokio::fs::write(&existing, b"mp3").await.unwrap();

        let key = mix_fingerprint("/audio/output/a.mp3", "/audio/output/b.mp3", 0.3);
        mixer.mix_cache.put(key, existing);

        // Different speech volume still hits the cached mix
        let outcome = mixer
            .mix_with_music("/audio/output/a.mp3", "/audio/output/b.mp3", 0.5, 0.3)
            .await
            .unwrap();
        assert!(outcome.cached);
    }
}
