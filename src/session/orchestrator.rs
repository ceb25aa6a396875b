//! Session orchestration: one audio source, one socket, one sink.
//!
//! `Session::start` wires the capture loop to the socket and the socket to
//! the dispatcher, then hands back a `SessionHandle`. All connection state
//! lives in the handle and its tasks; two sessions in one process do not
//! share anything.

use crate::audio::chunker::FrameChunker;
use crate::audio::source::AudioSource;
use crate::config::{Config, SessionConfig};
use crate::defaults;
use crate::error::{LinguaError, Result};
use crate::session::dispatcher::{ResultDispatcher, TranscriptSink};
use crate::session::reconnect::ReconnectPolicy;
use crate::session::socket::{ConnectionState, TranscriptionSocket};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// A running transcription session.
pub struct Session {
    config: Config,
    verbose: bool,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            verbose: false,
        }
    }

    /// Log connection status events to stderr.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Start capturing and streaming.
    ///
    /// Resolves once the source is running and the socket handshake has
    /// completed; the returned handle controls the session. Failures to
    /// start (microphone permission, unreachable server) are reported to the
    /// sink's error hook and returned.
    pub async fn start(
        self,
        mut source: Box<dyn AudioSource>,
        sink: Box<dyn TranscriptSink>,
    ) -> Result<SessionHandle> {
        let mut dispatcher = ResultDispatcher::new(sink).verbose(self.verbose);

        if let Err(e) = source.start() {
            let _ = dispatcher.error(&e);
            return Err(e);
        }

        let socket = Arc::new(TranscriptionSocket::new(self.config.connection.clone()));
        let session_cfg = Arc::new(StdMutex::new(self.config.session.clone()));

        if let Err(e) = socket.connect(&self.config.session).await {
            let _ = source.stop();
            let _ = dispatcher.error(&e);
            return Err(e);
        }
        let _ = dispatcher.connected();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (capture_done_tx, capture_done_rx) = oneshot::channel();

        let capture = tokio::spawn(capture_loop(
            source,
            Arc::clone(&socket),
            self.config.audio.block_size,
            shutdown_rx.clone(),
            capture_done_tx,
        ));

        let policy = ReconnectPolicy::from_config(&self.config.connection);
        let receive = tokio::spawn(receive_loop(
            Arc::clone(&socket),
            Arc::clone(&session_cfg),
            dispatcher,
            policy,
            shutdown_rx,
        ));

        Ok(SessionHandle {
            socket,
            session_cfg,
            shutdown_tx,
            capture: Some(capture),
            receive: Some(receive),
            capture_done: Some(capture_done_rx),
            stopped: false,
        })
    }
}

/// Control handle for a running session.
pub struct SessionHandle {
    socket: Arc<TranscriptionSocket>,
    session_cfg: Arc<StdMutex<SessionConfig>>,
    shutdown_tx: watch::Sender<bool>,
    capture: Option<JoinHandle<()>>,
    receive: Option<JoinHandle<()>>,
    capture_done: Option<oneshot::Receiver<()>>,
    stopped: bool,
}

impl SessionHandle {
    /// Current socket state.
    pub fn state(&self) -> ConnectionState {
        self.socket.state()
    }

    /// Change the session language mid-stream. The peer applies it to
    /// subsequent audio; None means auto-detection.
    pub async fn set_language(&self, language: Option<String>) -> Result<()> {
        let session = {
            let mut cfg = self
                .session_cfg
                .lock()
                .map_err(|e| LinguaError::Other(format!("session config lock poisoned: {}", e)))?;
            cfg.language = language;
            cfg.clone()
        };
        self.socket.set_config(&session).await
    }

    /// Wait until the audio source is exhausted. Only meaningful for finite
    /// sources (files, pipes); a microphone source never finishes on its own.
    pub async fn wait_for_capture(&mut self) {
        if let Some(done) = self.capture_done.take() {
            let _ = done.await;
        }
    }

    /// Stop the session: end capture, signal end of stream, wait out the
    /// grace period for trailing results, close. Safe to call repeatedly;
    /// only the first call does anything.
    pub async fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        let _ = self.shutdown_tx.send(true);
        if let Some(capture) = self.capture.take() {
            let _ = capture.await;
        }

        // eos + grace happen before the transport drops, so results already
        // in flight still reach the sink via the receive task.
        self.socket.close().await?;

        if let Some(receive) = self.receive.take() {
            let abort = receive.abort_handle();
            if tokio::time::timeout(defaults::CLOSE_DRAIN_TIMEOUT, receive)
                .await
                .is_err()
            {
                // The peer never answered the close handshake; the reader
                // would wait forever.
                abort.abort();
            }
        }
        Ok(())
    }
}

async fn capture_loop(
    mut source: Box<dyn AudioSource>,
    socket: Arc<TranscriptionSocket>,
    block_size: usize,
    mut shutdown: watch::Receiver<bool>,
    done: oneshot::Sender<()>,
) {
    let mut chunker = FrameChunker::new(block_size);
    let mut poll = tokio::time::interval(defaults::CAPTURE_POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = poll.tick() => {
                let samples = match source.read_samples() {
                    Ok(samples) => samples,
                    Err(_) => break,
                };
                let exhausted = source.is_finite() && samples.is_empty();

                for frame in chunker.push(&samples) {
                    // Dropped on the floor if the connection is down;
                    // frames are at-most-once.
                    let _ = socket.send_frame(&frame).await;
                }

                if exhausted {
                    break;
                }
            }
        }
    }

    if let Some(tail) = chunker.flush() {
        let _ = socket.send_frame(&tail).await;
    }
    let _ = source.stop();
    let _ = done.send(());
}

async fn receive_loop(
    socket: Arc<TranscriptionSocket>,
    session_cfg: Arc<StdMutex<SessionConfig>>,
    mut dispatcher: ResultDispatcher,
    policy: ReconnectPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempts_made = 0u32;

    loop {
        match socket.next_message().await {
            Ok(Some(message)) => {
                let _ = dispatcher.dispatch(message);
            }
            outcome => {
                if let Err(e) = outcome {
                    let _ = dispatcher.error(&e);
                }
                if *shutdown.borrow() {
                    // Intentional teardown, not a connection loss.
                    break;
                }
                match redial(
                    &socket,
                    &session_cfg,
                    &policy,
                    &mut attempts_made,
                    &mut shutdown,
                )
                .await
                {
                    Redial::Reconnected => {
                        let _ = dispatcher.connected();
                    }
                    Redial::GaveUp => break,
                }
            }
        }
    }

    let _ = dispatcher.disconnected();
}

enum Redial {
    Reconnected,
    GaveUp,
}

/// Attempt reconnection within the policy budget. Cancelled immediately by
/// session shutdown; a sleeping redial never outlives its session.
async fn redial(
    socket: &TranscriptionSocket,
    session_cfg: &StdMutex<SessionConfig>,
    policy: &ReconnectPolicy,
    attempts_made: &mut u32,
    shutdown: &mut watch::Receiver<bool>,
) -> Redial {
    loop {
        let Some(delay) = policy.next_delay(*attempts_made) else {
            return Redial::GaveUp;
        };
        *attempts_made += 1;

        tokio::select! {
            _ = shutdown.changed() => return Redial::GaveUp,
            _ = tokio::time::sleep(delay) => {}
        }

        let session = match session_cfg.lock() {
            Ok(cfg) => cfg.clone(),
            Err(_) => return Redial::GaveUp,
        };

        match socket.connect(&session).await {
            Ok(()) => {
                *attempts_made = 0;
                return Redial::Reconnected;
            }
            Err(_) => continue,
        }
    }
}
