use std::path::PathBuf;

/// All errors that can occur in jellysub.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no path mapping rule matched: {path}")]
    NoMappingRule { path: String },

    #[error("invalid path mapping pattern {pattern:?}: {source}")]
    InvalidMappingPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("transcription capacity reached ({limit} concurrent jobs)")]
    AtCapacity { limit: usize },

    #[error("media file not found: {path}")]
    MediaNotFound { path: PathBuf },

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("subtitle mux failed: {0}")]
    Mux(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
