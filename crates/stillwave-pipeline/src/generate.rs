//! End-to-end session generation.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use stillwave_media::{concat_audio, move_file};
use stillwave_models::{TtsModel, Voice};
use stillwave_storage::ArtifactStore;

use crate::chunks::UnitSynthesizer;
use crate::config::PipelineConfig;
use crate::coordinator::process_units;
use crate::error::{PipelineError, PipelineResult};
use crate::segment::segment_script;

/// Result of one generation run, with chunk accounting for the response.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub audio_url: String,
    pub chunks_total: usize,
    pub chunks_processed: usize,
    pub chunks_cached: usize,
    pub chunks_dropped: usize,
    pub generation_time_seconds: f64,
}

/// Drives segmentation, synthesis and assembly for one script.
pub struct AudioGenerator {
    synth: Arc<dyn UnitSynthesizer>,
    store: ArtifactStore,
    config: PipelineConfig,
}

impl AudioGenerator {
    pub fn new(
        synth: Arc<dyn UnitSynthesizer>,
        store: ArtifactStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            synth,
            store,
            config,
        }
    }

    /// Generate a full session from a script.
    ///
    /// Dropped chunks shorten the output but do not fail the request;
    /// only a script where nothing at all rendered is an error.
    pub async fn generate_audio(
        &self,
        script: &str,
        voice: Voice,
        model: TtsModel,
    ) -> PipelineResult<GenerationOutcome> {
        let started = Instant::now();

        let units = segment_script(script, self.config.max_chunk_chars)?;
        if units.is_empty() {
            return Err(PipelineError::segmentation("script contains no content"));
        }

        info!(units = units.len(), voice = voice.as_str(), "Starting generation");

        let artifacts = process_units(
            self.synth.as_ref(),
            &units,
            voice,
            model,
            self.config.batch_size,
        )
        .await;

        let chunks_total = artifacts.len();
        let chunks_cached = artifacts
            .iter()
            .filter(|s| s.as_ref().is_some_and(|a| a.cached))
            .count();
        let files: Vec<_> = artifacts
            .into_iter()
            .flatten()
            .map(|a| a.path)
            .collect();
        let chunks_processed = files.len();
        let chunks_dropped = chunks_total - chunks_processed;

        if files.is_empty() {
            return Err(PipelineError::synthesis(
                "no audio could be generated for the script",
            ));
        }

        // Assemble in tmp, publish under output/ once complete
        let staging = self.store.tmp_path();
        if let Err(e) = concat_audio(&files, &staging).await {
            self.store.discard_tmp(&staging).await;
            return Err(PipelineError::assembly(e.to_string()));
        }

        let output = self
            .store
            .output_path(&format!("meditation_{}", Uuid::new_v4()));
        if let Err(e) = move_file(&staging, &output).await {
            self.store.discard_tmp(&staging).await;
            return Err(e.into());
        }
        let audio_url = self.store.url_for(&output)?;

        let generation_time_seconds = started.elapsed().as_secs_f64();
        info!(
            audio_url = %audio_url,
            chunks_total,
            chunks_processed,
            chunks_cached,
            chunks_dropped,
            elapsed = generation_time_seconds,
            "Generation complete"
        );

        Ok(GenerationOutcome {
            audio_url,
            chunks_total,
            chunks_processed,
            chunks_cached,
            chunks_dropped,
            generation_time_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::ChunkArtifact;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use stillwave_models::ScriptUnit;
    use stillwave_storage::StorageConfig;
    use tempfile::TempDir;

    /// Writes one byte per unit so assembly hits the single/multi paths
    /// without ffmpeg.
    struct FileWritingSynth {
        dir: PathBuf,
        fail_all: bool,
    }

    #[async_trait]
    impl UnitSynthesizer for FileWritingSynth {
        async fn synthesize_unit(
            &self,
            unit: &ScriptUnit,
            _voice: Voice,
            _model: TtsModel,
        ) -> PipelineResult<ChunkArtifact> {
            if self.fail_all {
                return Err(PipelineError::synthesis("down"));
            }
            let name = match unit {
                ScriptUnit::Speech { text } => format!("s_{:x}", md5ish(text)),
                ScriptUnit::Silence { seconds } => format!("p_{}", seconds),
            };
            let path = self.dir.join(format!("{}.mp3", name));
            tokio::fs::write(&path, b"x").await.unwrap();
            Ok(ChunkArtifact {
                path,
                cached: false,
            })
        }
    }

    /// Claims success without writing the chunk, so assembly fails.
    struct GhostSynth {
        dir: PathBuf,
    }

    #[async_trait]
    impl UnitSynthesizer for GhostSynth {
        async fn synthesize_unit(
            &self,
            _unit: &ScriptUnit,
            _voice: Voice,
            _model: TtsModel,
        ) -> PipelineResult<ChunkArtifact> {
            Ok(ChunkArtifact {
                path: self.dir.join("ghost.mp3"),
                cached: false,
            })
        }
    }

    fn md5ish(s: &str) -> u64 {
        s.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
    }

    async fn generator_in(dir: &TempDir, fail_all: bool) -> AudioGenerator {
        let store = ArtifactStore::init(&StorageConfig {
            root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();
        let synth = FileWritingSynth {
            dir: dir.path().to_path_buf(),
            fail_all,
        };
        AudioGenerator::new(Arc::new(synth), store, PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_empty_script_is_rejected() {
        let dir = TempDir::new().unwrap();
        let gen = generator_in(&dir, false).await;

        let err = gen
            .generate_audio("   ", Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Segmentation(_)));
    }

    #[tokio::test]
    async fn test_total_synthesis_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let gen = generator_in(&dir, true).await;

        let err = gen
            .generate_audio("Breathe in.", Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_failed_assembly_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::init(&StorageConfig {
            root: dir.path().to_path_buf(),
        })
        .await
        .unwrap();
        let synth = GhostSynth {
            dir: dir.path().to_path_buf(),
        };
        let gen = AudioGenerator::new(Arc::new(synth), store, PipelineConfig::default());

        let err = gen
            .generate_audio("Breathe in.", Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Assembly(_)));

        let leftover = std::fs::read_dir(gen.store.tmp_dir()).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_single_unit_script_produces_output() {
        let dir = TempDir::new().unwrap();
        let gen = generator_in(&dir, false).await;

        let outcome = gen
            .generate_audio("Breathe in.", Voice::Nova, TtsModel::Tts1)
            .await
            .unwrap();

        assert!(outcome.audio_url.starts_with("/audio/output/meditation_"));
        assert_eq!(outcome.chunks_total, 1);
        assert_eq!(outcome.chunks_processed, 1);
        assert_eq!(outcome.chunks_dropped, 0);
        assert!(gen.store.resolve(&outcome.audio_url).is_ok());
    }
}
