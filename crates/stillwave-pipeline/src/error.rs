//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Silence generation failed: {0}")]
    SilenceGeneration(String),

    #[error("Assembly failed: {0}")]
    Assembly(String),

    #[error("Mix failed: {0}")]
    Mix(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Speech API error: {0}")]
    Tts(#[from] stillwave_tts::TtsError),

    #[error("Media error: {0}")]
    Media(#[from] stillwave_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] stillwave_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn segmentation(msg: impl Into<String>) -> Self {
        Self::Segmentation(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn silence(msg: impl Into<String>) -> Self {
        Self::SilenceGeneration(msg.into())
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    pub fn mix(msg: impl Into<String>) -> Self {
        Self::Mix(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
