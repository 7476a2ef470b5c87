use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use stillwave_models::{TtsModel, Voice};

use crate::config::TtsConfig;
use crate::error::{TtsError, TtsResult};

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Client for the `/v1/audio/speech` endpoint.
#[derive(Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    config: TtsConfig,
}

impl TtsClient {
    pub fn new(config: TtsConfig) -> TtsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Synthesize one speech chunk, returning MP3 bytes.
    pub async fn synthesize(&self, text: &str, voice: Voice, model: TtsModel) -> TtsResult<Bytes> {
        let url = format!("{}/v1/audio/speech", self.config.base_url);

        debug!(
            voice = voice.as_str(),
            model = model.as_str(),
            chars = text.len(),
            "Requesting speech synthesis"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&SpeechRequest {
                model: model.as_str(),
                voice: voice.as_str(),
                input: text,
                response_format: "mp3",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Speech API request failed");
            return Err(TtsError::Api {
                status: status.as_u16(),
                message: truncate_message(&message),
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyResponse);
        }

        debug!(bytes = audio.len(), "Received synthesized audio");
        Ok(audio)
    }
}

/// API error bodies can be large HTML pages; keep logs and errors bounded.
fn truncate_message(message: &str) -> String {
    const MAX: usize = 500;
    if message.len() <= MAX {
        message.to_string()
    } else {
        let mut end = MAX;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &message[..end])
    }
}
