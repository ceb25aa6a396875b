//! Command-line interface for linguastream
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Streaming speech transcription client
#[derive(Parser, Debug)]
#[command(
    name = "linguastream",
    version,
    about = "Streaming speech transcription client"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: connection status, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device (see `linguastream devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de, fr
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Transcription server WebSocket URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Transcribe a WAV file instead of the microphone
    #[arg(long, short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate a language lesson from the backend
    #[cfg(feature = "lesson")]
    Lesson {
        /// Target language (e.g. french, japanese)
        #[arg(value_name = "LANGUAGE")]
        language: String,

        /// Difficulty level
        #[arg(long, short = 'd', value_name = "LEVEL", default_value = "beginner")]
        difficulty: String,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init,

    /// Print the configuration file path
    Path,
}
