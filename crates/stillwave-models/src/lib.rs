//! Shared data models for the Stillwave backend.
//!
//! This crate provides Serde-serializable types for:
//! - Segmented script units (speech and silence)
//! - Voice and synthesis model enums
//! - Content fingerprints used as cache keys
//! - API request/response schemas

pub mod fingerprint;
pub mod requests;
pub mod unit;
pub mod voice;

// Re-export common types
pub use fingerprint::{chunk_fingerprint, mix_fingerprint, silence_key};
pub use requests::{
    GenerateAudioRequest, GenerateAudioResponse, MixAudioRequest, MixAudioResponse,
    VoiceCatalogResponse,
};
pub use unit::ScriptUnit;
pub use voice::{TtsModel, Voice, VoiceParseError};
