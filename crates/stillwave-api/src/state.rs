//! Application state.

use std::sync::Arc;
use std::time::Duration;

use stillwave_pipeline::{AudioGenerator, ChunkSynthesizer, MusicMixer, PipelineConfig};
use stillwave_storage::{ArtifactCache, ArtifactStore, StorageConfig};
use stillwave_tts::{TtsClient, TtsConfig};

use crate::config::ApiConfig;

/// Retention for chunk and mix caches.
const CACHE_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: ArtifactStore,
    pub generator: Arc<AudioGenerator>,
    pub mixer: Arc<MusicMixer>,
    /// All caches, in janitor registration order.
    pub caches: Vec<Arc<ArtifactCache>>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = ArtifactStore::init(&StorageConfig::from_env()).await?;
        let tts = TtsClient::new(TtsConfig::from_env()?)?;

        let chunk_cache = Arc::new(ArtifactCache::new("chunks", Some(CACHE_RETENTION)));
        // Silence depends only on its duration, never worth re-rendering
        let silence_cache = Arc::new(ArtifactCache::new("silence", None));
        let mix_cache = Arc::new(ArtifactCache::new("mixes", Some(CACHE_RETENTION)));

        let synth = Arc::new(ChunkSynthesizer::new(
            tts,
            store.clone(),
            Arc::clone(&chunk_cache),
            Arc::clone(&silence_cache),
        ));

        let generator = Arc::new(AudioGenerator::new(
            synth,
            store.clone(),
            PipelineConfig::from_env(),
        ));
        let mixer = Arc::new(MusicMixer::new(store.clone(), Arc::clone(&mix_cache)));

        Ok(Self {
            config,
            store,
            generator,
            mixer,
            caches: vec![chunk_cache, silence_cache, mix_cache],
        })
    }
}
