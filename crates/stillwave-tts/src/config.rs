use crate::error::{TtsError, TtsResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the speech API.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl TtsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load from environment. `OPENAI_API_KEY` is required; `TTS_BASE_URL`
    /// and `TTS_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> TtsResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| TtsError::config("OPENAI_API_KEY is not set"))?;

        let base_url = std::env::var("TTS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = std::env::var("TTS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = TtsConfig::new("sk-test").with_base_url("http://localhost:9090/");
        assert_eq!(config.base_url, "http://localhost:9090");
    }

    #[test]
    fn test_defaults() {
        let config = TtsConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
