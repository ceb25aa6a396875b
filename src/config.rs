use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub session: SessionConfig,
    pub audio: AudioConfig,
    pub lesson: LessonConfig,
}

/// WebSocket connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub handshake_timeout_ms: u64,
}

/// Transcription session parameters, re-sent to the peer on every change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Language code, or None for auto-detection. The literal string
    /// "auto" in a config file also means auto-detection.
    pub language: Option<String>,
    pub sample_rate: u32,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub block_size: usize,
}

/// Lesson endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LessonConfig {
    pub base_url: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_WS_URL.to_string(),
            reconnect_delay_ms: defaults::RECONNECT_DELAY.as_millis() as u64,
            max_reconnect_attempts: defaults::MAX_RECONNECT_ATTEMPTS,
            handshake_timeout_ms: defaults::HANDSHAKE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            block_size: defaults::BLOCK_SIZE,
        }
    }
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::DEFAULT_API_URL.to_string(),
        }
    }
}

impl SessionConfig {
    /// Language for the wire protocol: "auto" (any casing) and empty
    /// strings collapse to None.
    pub fn wire_language(&self) -> Option<String> {
        match self.language.as_deref() {
            None => None,
            Some(s) if s.is_empty() || s.eq_ignore_ascii_case("auto") => None,
            Some(s) => Some(s.to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LINGUASTREAM_URL → connection.url
    /// - LINGUASTREAM_LANGUAGE → session.language
    /// - LINGUASTREAM_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("LINGUASTREAM_URL")
            && !url.is_empty()
        {
            self.connection.url = url;
        }

        if let Ok(language) = std::env::var("LINGUASTREAM_LANGUAGE")
            && !language.is_empty()
        {
            self.session.language = Some(language);
        }

        if let Ok(device) = std::env::var("LINGUASTREAM_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/linguastream/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linguastream")
            .join("config.toml")
    }
}
