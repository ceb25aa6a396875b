//! Terminal rendering for transcription results.
//!
//! Partials overwrite a single live line; finals commit a permanent line
//! with words colored by recognition confidence. Transcripts print to
//! stdout so they can be piped; status noise goes to stderr.

use crate::error::{LinguaError, Result};
use crate::protocol::{Transcript, Word};
use crate::session::dispatcher::TranscriptSink;
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Clear the current terminal line (replaces the live partial).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

/// Return the ANSI color code for a word confidence.
fn confidence_color(confidence: f32) -> &'static str {
    if confidence >= 0.9 {
        GREEN
    } else if confidence >= 0.7 {
        "" // default terminal color
    } else if confidence >= 0.5 {
        YELLOW
    } else {
        RED
    }
}

/// Render words colored by confidence. Falls back to plain text when the
/// backend sent no word timing.
fn render_words_colored(text: &str, words: &[Word]) {
    if words.is_empty() {
        print!("{text}");
        return;
    }
    let mut first = true;
    for word in words {
        if !first {
            print!(" ");
        }
        first = false;
        let color = confidence_color(word.confidence);
        if color.is_empty() {
            print!("{}", word.text);
        } else {
            print!("{color}{}{RESET}", word.text);
        }
    }
}

/// Sink that renders transcripts to the terminal.
pub struct TerminalSink {
    color: bool,
    /// Whether a live partial currently occupies the output line.
    partial_pending: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            color: true,
            partial_pending: false,
        }
    }

    /// Disable ANSI coloring (piped output, NO_COLOR).
    pub fn plain(mut self) -> Self {
        self.color = false;
        self
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for TerminalSink {
    fn on_partial(&mut self, transcript: &Transcript) -> Result<()> {
        clear_line();
        if self.color {
            print!("{DIM}{}{RESET}", transcript.text);
        } else {
            print!("{}", transcript.text);
        }
        self.partial_pending = true;
        io::stdout().flush().map_err(LinguaError::Io)
    }

    fn on_final(&mut self, transcript: &Transcript) -> Result<()> {
        if self.partial_pending {
            clear_line();
            self.partial_pending = false;
        }
        if self.color {
            render_words_colored(&transcript.text, &transcript.words);
            if let Some(lang) = transcript.language.as_deref() {
                print!(" {DIM}[{lang}]{RESET}");
            }
            println!();
        } else {
            println!("{}", transcript.text);
        }
        io::stdout().flush().map_err(LinguaError::Io)
    }

    fn on_error(&mut self, error: &LinguaError) -> Result<()> {
        if self.partial_pending {
            clear_line();
            self.partial_pending = false;
        }
        eprintln!("{RED}{}{RESET}", error);
        Ok(())
    }

    fn on_disconnected(&mut self) -> Result<()> {
        if self.partial_pending {
            // Leave the last partial visible; it is the best text we have.
            println!();
            self.partial_pending = false;
        }
        io::stdout().flush().map_err(LinguaError::Io)
    }

    fn name(&self) -> &str {
        "terminal"
    }
}
