//! JSON wire protocol for the real-time transcription WebSocket.
//!
//! One bidirectional connection multiplexes configuration, audio streaming,
//! and result delivery. Every message is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

/// Messages sent by the client to the transcription server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Set or update session parameters. `language: None` means auto-detect
    /// and serializes as JSON `null`.
    Config {
        language: Option<String>,
        sample_rate: u32,
    },
    /// One PCM16 frame, base64-encoded little-endian bytes.
    Audio { data: String },
    /// End of audio stream; no further frames follow.
    Eos,
}

impl ClientMessage {
    /// Serialize message to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Messages sent by the transcription server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake acknowledged; the session is ready for audio.
    Connected {
        #[serde(default)]
        message: Option<String>,
    },
    /// A config change was acknowledged. Also accepted as the handshake ack.
    ConfigUpdated {
        #[serde(default)]
        message: Option<String>,
    },
    /// In-progress transcript; superseded by later partial or final events.
    Partial {
        #[serde(default)]
        text: String,
        #[serde(default)]
        words: Vec<Word>,
    },
    /// Confirmed transcript the peer will not revise further.
    Final {
        #[serde(default)]
        text: String,
        #[serde(default)]
        words: Vec<Word>,
        #[serde(default)]
        language: Option<String>,
    },
    /// Utterance boundary marker.
    UtteranceEnd,
    /// Server acknowledges the end of the audio stream.
    EosReceived {
        #[serde(default)]
        message: Option<String>,
    },
    /// Semantic failure reported by the peer. Does not close the connection.
    Error { message: String },
    /// Catch-all for message types this client does not understand.
    /// Unknown types are ignored rather than treated as protocol errors.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Serialize message to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A word-level token within a transcript.
///
/// Upstream ASR backends disagree on field names (`word` vs `text`); both
/// are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default, alias = "word")]
    pub text: String,
    /// Start offset in seconds from the beginning of the utterance.
    #[serde(default)]
    pub start: f32,
    /// End offset in seconds.
    #[serde(default)]
    pub end: f32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// Confidence assumed when the backend omits one.
fn default_confidence() -> f32 {
    0.9
}

impl Word {
    /// Create a word token with the default confidence.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            start: 0.0,
            end: 0.0,
            confidence: default_confidence(),
        }
    }
}

/// A transcript event delivered to the caller. Immutable once created;
/// partial events are superseded by later events for the same utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub words: Vec<Word>,
    pub is_final: bool,
    pub language: Option<String>,
}

impl Transcript {
    /// Build an in-progress (revisable) transcript event.
    pub fn partial(text: String, words: Vec<Word>) -> Self {
        Self {
            text,
            words,
            is_final: false,
            language: None,
        }
    }

    /// Build a confirmed transcript event.
    pub fn final_result(text: String, words: Vec<Word>, language: Option<String>) -> Self {
        Self {
            text,
            words,
            is_final: true,
            language,
        }
    }
}
