//! WebSocket transport to the transcription backend.
//!
//! One socket per session. The connection handshake is protocol-level, not
//! transport-level: `connect` resolves only after the peer acknowledges the
//! initial config message, so a caller holding an open socket knows the
//! session parameters are in effect before the first audio frame goes out.

use crate::audio::pcm;
use crate::config::{ConnectionConfig, SessionConfig};
use crate::defaults;
use crate::error::{LinguaError, Result};
use crate::protocol::{ClientMessage, ServerMessage};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Lifecycle of a transcription socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, never connected.
    Idle,
    /// Transport dial and protocol handshake in progress.
    Connecting,
    /// Handshake acknowledged; audio may flow.
    Open,
    /// Closed by either side. Terminal until the next `connect`.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// A single WebSocket connection speaking the transcription protocol.
///
/// All methods take `&self`; the reader and writer halves are independently
/// locked so result delivery never blocks audio sending. Sends while the
/// socket is not open are silent no-ops: frames are at-most-once, and audio
/// captured during an outage is dropped rather than queued.
pub struct TranscriptionSocket {
    config: ConnectionConfig,
    state: StdMutex<ConnectionState>,
    writer: Mutex<Option<WsWriter>>,
    reader: Mutex<Option<WsReader>>,
    eos_sent: AtomicBool,
}

impl TranscriptionSocket {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: StdMutex::new(ConnectionState::Idle),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            eos_sent: AtomicBool::new(false),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Closed)
    }

    fn set_state(&self, state: ConnectionState) {
        if let Ok(mut s) = self.state.lock() {
            *s = state;
        }
    }

    fn config_message(session: &SessionConfig) -> ClientMessage {
        ClientMessage::Config {
            language: session.wire_language(),
            sample_rate: session.sample_rate,
        }
    }

    /// Dial the server and complete the protocol handshake.
    ///
    /// Sends the session config immediately after the transport opens, then
    /// waits for a `connected` or `config_updated` acknowledgement. The whole
    /// sequence is bounded by the configured handshake timeout. On any
    /// failure the socket ends up `Closed`.
    pub async fn connect(&self, session: &SessionConfig) -> Result<()> {
        match self.state() {
            ConnectionState::Connecting | ConnectionState::Open => {
                return Err(LinguaError::Transport {
                    message: "connect called on an active connection".to_string(),
                });
            }
            ConnectionState::Idle | ConnectionState::Closed => {}
        }

        self.set_state(ConnectionState::Connecting);
        let deadline = Instant::now() + Duration::from_millis(self.config.handshake_timeout_ms);

        match self.handshake(session, deadline).await {
            Ok((writer, reader)) => {
                *self.writer.lock().await = Some(writer);
                *self.reader.lock().await = Some(reader);
                self.eos_sent.store(false, Ordering::SeqCst);
                self.set_state(ConnectionState::Open);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Closed);
                Err(e)
            }
        }
    }

    async fn handshake(
        &self,
        session: &SessionConfig,
        deadline: Instant,
    ) -> Result<(WsWriter, WsReader)> {
        let connect = timeout_at(deadline, connect_async(self.config.url.as_str()))
            .await
            .map_err(|_| LinguaError::Transport {
                message: format!("Connection to {} timed out", self.config.url),
            })?;

        let (mut ws, _response) = connect.map_err(|e| LinguaError::Transport {
            message: format!("Failed to connect to {}: {}", self.config.url, e),
        })?;

        let config_json =
            Self::config_message(session)
                .to_json()
                .map_err(|e| LinguaError::Protocol {
                    message: format!("Failed to encode config message: {}", e),
                })?;

        ws.send(Message::text(config_json))
            .await
            .map_err(|e| LinguaError::Transport {
                message: format!("Failed to send config message: {}", e),
            })?;

        // Drain until the ack; the server sends nothing else before it.
        loop {
            let frame = timeout_at(deadline, ws.next())
                .await
                .map_err(|_| LinguaError::Transport {
                    message: "Timed out waiting for handshake acknowledgement".to_string(),
                })?;

            let msg = match frame {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Err(LinguaError::Transport {
                        message: format!("Connection failed during handshake: {}", e),
                    });
                }
                None => {
                    return Err(LinguaError::Transport {
                        message: "Server closed the connection during handshake".to_string(),
                    });
                }
            };

            let Message::Text(text) = msg else {
                continue;
            };

            match ServerMessage::from_json(text.as_str()) {
                Ok(ServerMessage::Connected { .. } | ServerMessage::ConfigUpdated { .. }) => {
                    return Ok(ws.split());
                }
                Ok(ServerMessage::Error { message }) => {
                    return Err(LinguaError::Transport {
                        message: format!("Server rejected the session: {}", message),
                    });
                }
                Ok(_) | Err(_) => continue,
            }
        }
    }

    /// Send one audio frame.
    ///
    /// Samples go out as base64-encoded little-endian PCM16. A silent no-op
    /// unless the socket is open.
    pub async fn send_frame(&self, samples: &[i16]) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Ok(());
        }

        let msg = ClientMessage::Audio {
            data: BASE64.encode(pcm::to_le_bytes(samples)),
        };
        self.send_message(&msg).await
    }

    /// Push an updated session config to the peer. No-op unless open.
    pub async fn set_config(&self, session: &SessionConfig) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Ok(());
        }
        self.send_message(&Self::config_message(session)).await
    }

    async fn send_message(&self, msg: &ClientMessage) -> Result<()> {
        let json = msg.to_json().map_err(|e| LinguaError::Protocol {
            message: format!("Failed to encode message: {}", e),
        })?;

        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Ok(());
        };

        writer
            .send(Message::text(json))
            .await
            .map_err(|e| {
                self.set_state(ConnectionState::Closed);
                LinguaError::Transport {
                    message: format!("Failed to send message: {}", e),
                }
            })
    }

    /// Signal end of stream and close the connection.
    ///
    /// Sends `eos` exactly once, waits a fixed grace period so in-flight
    /// results can still arrive, then closes the transport. Idempotent; the
    /// grace period applies whether or not the server acknowledges.
    pub async fn close(&self) -> Result<()> {
        let state = self.state();
        if state == ConnectionState::Closed {
            return Ok(());
        }

        if state == ConnectionState::Open && !self.eos_sent.swap(true, Ordering::SeqCst) {
            // Best effort: a dead transport still gets the grace sleep so the
            // shutdown sequence is timing-identical either way.
            let _ = self.send_message(&ClientMessage::Eos).await;
            tokio::time::sleep(defaults::EOS_GRACE).await;
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.close().await;
        }
        self.set_state(ConnectionState::Closed);
        Ok(())
    }

    /// Receive the next protocol message.
    ///
    /// Returns `Ok(None)` on clean close (by either side), `Err` on transport
    /// failure. Malformed JSON frames are skipped rather than fatal: one bad
    /// frame must not kill a live stream.
    pub async fn next_message(&self) -> Result<Option<ServerMessage>> {
        loop {
            let frame = {
                let mut reader = self.reader.lock().await;
                let Some(reader) = reader.as_mut() else {
                    return Ok(None);
                };
                reader.next().await
            };

            match frame {
                None => {
                    self.set_state(ConnectionState::Closed);
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.set_state(ConnectionState::Closed);
                    return Err(LinguaError::Transport {
                        message: format!("Connection lost: {}", e),
                    });
                }
                Some(Ok(Message::Text(text))) => match ServerMessage::from_json(text.as_str()) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(_) => continue,
                },
                Some(Ok(Message::Close(_))) => {
                    self.set_state(ConnectionState::Closed);
                    return Ok(None);
                }
                // Pings are answered by the library; binary frames are not
                // part of this protocol.
                Some(Ok(_)) => continue,
            }
        }
    }
}
