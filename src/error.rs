//! Error types for linguastream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinguaError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Microphone access denied: {message}")]
    Permission { message: String },

    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Connection errors
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // Peer-reported transcription failure; the connection stays usable.
    #[error("Transcription error: {message}")]
    Semantic { message: String },

    // Lesson endpoint errors
    #[error("Lesson request failed: {message}")]
    Lesson { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl LinguaError {
    /// True for errors that abort the session (permission/transport class).
    ///
    /// Semantic errors reported by the peer are surfaced but leave the
    /// connection open.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LinguaError::Permission { .. }
                | LinguaError::Transport { .. }
                | LinguaError::AudioDeviceNotFound { .. }
                | LinguaError::AudioCapture { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LinguaError>;
