/// Tunable pipeline limits.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Units synthesized concurrently per batch.
    pub batch_size: usize,
    /// Hard ceiling on the size of a single speech unit, in characters.
    pub max_chunk_chars: usize,
}

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const MAX_BATCH_SIZE: usize = 25;
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 4000;

impl PipelineConfig {
    /// Load from environment with defaults. `PIPELINE_BATCH_SIZE` tunes
    /// concurrent API pressure; clamped so a typo cannot stampede the
    /// synthesis endpoint.
    pub fn from_env() -> Self {
        let batch_size = std::env::var("PIPELINE_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .clamp(1, MAX_BATCH_SIZE);

        Self {
            batch_size,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}
