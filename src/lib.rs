//! linguastream - Streaming speech transcription client
//!
//! Captures audio, streams it to a real-time transcription backend over a
//! WebSocket, and delivers partial and final transcripts to pluggable sinks.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod control;
pub mod defaults;
pub mod error;
#[cfg(feature = "lesson")]
pub mod lesson;
pub mod output;
pub mod protocol;
pub mod session;

// Core traits (source → session → sink)
pub use audio::source::{AudioSource, AudioSourceConfig, MockAudioSource};
pub use output::TerminalSink;
pub use session::dispatcher::{CollectorSink, ResultDispatcher, TranscriptSink};

// Session
pub use session::orchestrator::{Session, SessionHandle};
pub use session::socket::{ConnectionState, TranscriptionSocket};

// Protocol
pub use protocol::{ClientMessage, ServerMessage, Transcript, Word};

// Error handling
pub use error::{LinguaError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
