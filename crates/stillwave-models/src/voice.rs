//! Voice and synthesis model definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available synthesis voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    #[default]
    Nova,
    Onyx,
    Shimmer,
}

impl Voice {
    /// All available voices.
    pub const ALL: &'static [Voice] = &[
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Nova,
        Voice::Onyx,
        Voice::Shimmer,
    ];

    /// The voice name as used on the wire and in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Nova => "nova",
            Voice::Onyx => "onyx",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Voice {
    type Err = VoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alloy" => Ok(Voice::Alloy),
            "echo" => Ok(Voice::Echo),
            "fable" => Ok(Voice::Fable),
            "nova" => Ok(Voice::Nova),
            "onyx" => Ok(Voice::Onyx),
            "shimmer" => Ok(Voice::Shimmer),
            _ => Err(VoiceParseError(s.to_string())),
        }
    }
}

/// Available synthesis models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TtsModel {
    /// Standard-latency model.
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    /// Higher-quality model.
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
}

impl TtsModel {
    /// All available models.
    pub const ALL: &'static [TtsModel] = &[TtsModel::Tts1, TtsModel::Tts1Hd];

    /// The model identifier as used on the wire and in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsModel::Tts1 => "tts-1",
            TtsModel::Tts1Hd => "tts-1-hd",
        }
    }
}

impl fmt::Display for TtsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TtsModel {
    type Err = VoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tts-1" => Ok(TtsModel::Tts1),
            "tts-1-hd" => Ok(TtsModel::Tts1Hd),
            _ => Err(VoiceParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown voice or model: {0}")]
pub struct VoiceParseError(String);
