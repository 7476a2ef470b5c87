use thiserror::Error;

pub type TtsResult<T> = Result<T, TtsError>;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Speech API returned an empty audio body")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TtsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::EmptyResponse => true,
            Self::Config(_) => false,
        }
    }
}
