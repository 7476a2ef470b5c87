//! Speech synthesis client for the OpenAI audio API.

pub mod client;
pub mod config;
pub mod error;

pub use client::TtsClient;
pub use config::TtsConfig;
pub use error::{TtsError, TtsResult};
