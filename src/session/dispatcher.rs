//! Routing of server messages to caller-provided handlers.

use crate::error::{LinguaError, Result};
use crate::protocol::{ServerMessage, Transcript};
use std::sync::{Arc, Mutex};

/// Destination for transcription results.
///
/// Implementors override the hooks they care about; every hook has a no-op
/// default so a sink that only wants finals stays small.
pub trait TranscriptSink: Send {
    /// An in-progress transcript. May be superseded by a later partial or
    /// the final for the same utterance.
    fn on_partial(&mut self, _transcript: &Transcript) -> Result<()> {
        Ok(())
    }

    /// A confirmed transcript. Never revised afterwards.
    fn on_final(&mut self, _transcript: &Transcript) -> Result<()> {
        Ok(())
    }

    /// A semantic error reported by the server. The session stays up.
    fn on_error(&mut self, _error: &LinguaError) -> Result<()> {
        Ok(())
    }

    /// The session handshake completed (initial connect or reconnect).
    fn on_connected(&mut self) -> Result<()> {
        Ok(())
    }

    /// The session ended, cleanly or not. Called at most once per connection.
    fn on_disconnected(&mut self) -> Result<()> {
        Ok(())
    }

    /// Sink name for diagnostics.
    fn name(&self) -> &str {
        "sink"
    }
}

/// Routes decoded protocol messages to a sink by message type.
///
/// Status acknowledgements (`connected`, `config_updated`, `eos_received`)
/// and utterance boundaries carry no transcript payload and are consumed
/// here; unknown message types are dropped silently.
pub struct ResultDispatcher {
    sink: Box<dyn TranscriptSink>,
    verbose: bool,
}

impl ResultDispatcher {
    pub fn new(sink: Box<dyn TranscriptSink>) -> Self {
        Self {
            sink,
            verbose: false,
        }
    }

    /// Log status acknowledgements to stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Route one server message. Sink errors propagate to the caller.
    pub fn dispatch(&mut self, message: ServerMessage) -> Result<()> {
        match message {
            ServerMessage::Partial { text, words } => {
                self.sink.on_partial(&Transcript::partial(text, words))
            }
            ServerMessage::Final {
                text,
                words,
                language,
            } => self
                .sink
                .on_final(&Transcript::final_result(text, words, language)),
            ServerMessage::Error { message } => {
                self.sink.on_error(&LinguaError::Semantic { message })
            }
            ServerMessage::Connected { message } | ServerMessage::ConfigUpdated { message } => {
                self.status("session ready", message.as_deref());
                Ok(())
            }
            ServerMessage::EosReceived { message } => {
                self.status("end of stream acknowledged", message.as_deref());
                Ok(())
            }
            ServerMessage::UtteranceEnd => Ok(()),
            ServerMessage::Unknown => Ok(()),
        }
    }

    /// Forward a connection-established event to the sink.
    pub fn connected(&mut self) -> Result<()> {
        self.sink.on_connected()
    }

    /// Forward a connection-ended event to the sink.
    pub fn disconnected(&mut self) -> Result<()> {
        self.sink.on_disconnected()
    }

    /// Forward a locally detected error (transport loss, capture failure).
    pub fn error(&mut self, error: &LinguaError) -> Result<()> {
        self.sink.on_error(error)
    }

    fn status(&self, event: &str, detail: Option<&str>) {
        if self.verbose {
            match detail {
                Some(d) => eprintln!("[{}] {}: {}", self.sink.name(), event, d),
                None => eprintln!("[{}] {}", self.sink.name(), event),
            }
        }
    }
}

/// Everything a sink observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Partial(Transcript),
    Final(Transcript),
    Error(String),
    Connected,
    Disconnected,
}

/// Records every event for inspection. Test instrumentation; the shared
/// event log stays readable after the sink moves into a session.
#[derive(Default)]
pub struct CollectorSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the event log, valid after the sink itself is moved.
    pub fn events(&self) -> Arc<Mutex<Vec<SinkEvent>>> {
        Arc::clone(&self.events)
    }

    fn record(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl TranscriptSink for CollectorSink {
    fn on_partial(&mut self, transcript: &Transcript) -> Result<()> {
        self.record(SinkEvent::Partial(transcript.clone()));
        Ok(())
    }

    fn on_final(&mut self, transcript: &Transcript) -> Result<()> {
        self.record(SinkEvent::Final(transcript.clone()));
        Ok(())
    }

    fn on_error(&mut self, error: &LinguaError) -> Result<()> {
        self.record(SinkEvent::Error(error.to_string()));
        Ok(())
    }

    fn on_connected(&mut self) -> Result<()> {
        self.record(SinkEvent::Connected);
        Ok(())
    }

    fn on_disconnected(&mut self) -> Result<()> {
        self.record(SinkEvent::Disconnected);
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}
