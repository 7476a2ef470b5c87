//! Audio generation and mixing handlers.

use axum::extract::State;
use axum::Json;
use tracing::info;
use validator::Validate;

use stillwave_models::{
    GenerateAudioRequest, GenerateAudioResponse, MixAudioRequest, MixAudioResponse, TtsModel,
    Voice, VoiceCatalogResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `POST /api/audio/generate`
pub async fn generate_audio(
    State(state): State<AppState>,
    Json(request): Json<GenerateAudioRequest>,
) -> ApiResult<Json<GenerateAudioResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let voice = parse_voice(request.voice.as_deref())?;
    let model = parse_model(request.model.as_deref())?;

    info!(
        script_chars = request.script.len(),
        voice = voice.as_str(),
        model = model.as_str(),
        "Generation requested"
    );

    let outcome = state
        .generator
        .generate_audio(&request.script, voice, model)
        .await?;

    metrics::record_generation(
        outcome.generation_time_seconds,
        outcome.chunks_processed - outcome.chunks_cached,
        outcome.chunks_cached,
        outcome.chunks_dropped,
    );

    Ok(Json(GenerateAudioResponse {
        audio_url: outcome.audio_url,
        chunks_total: outcome.chunks_total,
        chunks_processed: outcome.chunks_processed,
        chunks_cached: outcome.chunks_cached,
        chunks_dropped: outcome.chunks_dropped,
        generation_time_seconds: outcome.generation_time_seconds,
    }))
}

/// `POST /api/audio/mix`
pub async fn mix_audio(
    State(state): State<AppState>,
    Json(request): Json<MixAudioRequest>,
) -> ApiResult<Json<MixAudioResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let outcome = state
        .mixer
        .mix_with_music(
            &request.speech_url,
            &request.music_url,
            request.speech_volume,
            request.music_volume,
        )
        .await?;

    metrics::record_mix(outcome.merge_time_seconds, outcome.cached);

    Ok(Json(MixAudioResponse {
        mixed_audio_url: outcome.mixed_audio_url,
        merge_time_seconds: outcome.merge_time_seconds,
        cached: outcome.cached,
    }))
}

/// `GET /api/audio/voices`
pub async fn list_voices() -> Json<VoiceCatalogResponse> {
    Json(VoiceCatalogResponse {
        voices: Voice::ALL.iter().map(|v| v.as_str().to_string()).collect(),
        models: TtsModel::ALL
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    })
}

fn parse_voice(raw: Option<&str>) -> ApiResult<Voice> {
    match raw {
        None => Ok(Voice::default()),
        Some(v) => v.parse().map_err(|_| {
            ApiError::bad_request(format!(
                "unknown voice '{}', expected one of: {}",
                v,
                Voice::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }),
    }
}

fn parse_model(raw: Option<&str>) -> ApiResult<TtsModel> {
    match raw {
        None => Ok(TtsModel::default()),
        Some(m) => m.parse().map_err(|_| {
            ApiError::bad_request(format!(
                "unknown model '{}', expected one of: {}",
                m,
                TtsModel::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_defaults_and_rejects() {
        assert_eq!(parse_voice(None).unwrap(), Voice::default());
        assert_eq!(parse_voice(Some("onyx")).unwrap(), Voice::Onyx);
        assert!(parse_voice(Some("narrator")).is_err());
    }

    #[test]
    fn test_parse_model() {
        assert_eq!(parse_model(Some("tts-1-hd")).unwrap(), TtsModel::Tts1Hd);
        assert!(parse_model(Some("tts-2")).is_err());
    }
}
