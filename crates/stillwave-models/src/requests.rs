//! API request and response schemas.

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_speech_volume() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.3
}

/// Request body for `POST /api/audio/generate`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateAudioRequest {
    /// Meditation script text, optionally containing `{{PAUSE_<n>s}}` markers.
    #[validate(length(min = 1, max = 100_000, message = "script must be non-empty"))]
    pub script: String,
    /// Voice name; defaults to the service default when omitted.
    #[serde(default)]
    pub voice: Option<String>,
    /// Synthesis model; defaults to the service default when omitted.
    #[serde(default)]
    pub model: Option<String>,
}

/// Response body for `POST /api/audio/generate`.
///
/// Partial success is explicit: callers can tell how many units were served
/// from cache, synthesized fresh, or dropped after per-unit failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAudioResponse {
    pub audio_url: String,
    pub chunks_total: usize,
    pub chunks_processed: usize,
    pub chunks_cached: usize,
    pub chunks_dropped: usize,
    pub generation_time_seconds: f64,
}

/// Request body for `POST /api/audio/mix`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MixAudioRequest {
    /// URL of the assembled speech track (as returned by generate).
    #[validate(length(min = 1))]
    pub speech_url: String,
    /// URL of the background music track.
    #[validate(length(min = 1))]
    pub music_url: String,
    /// Linear gain applied to the speech stream.
    #[serde(default = "default_speech_volume")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub speech_volume: f64,
    /// Linear gain applied to the music stream.
    #[serde(default = "default_music_volume")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub music_volume: f64,
}

/// Response body for `POST /api/audio/mix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixAudioResponse {
    pub mixed_audio_url: String,
    pub merge_time_seconds: f64,
    pub cached: bool,
}

/// Response body for `GET /api/audio/voices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCatalogResponse {
    pub voices: Vec<String>,
    pub models: Vec<String>,
}
