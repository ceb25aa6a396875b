//! Default configuration constants for linguastream.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and bandwidth for streamed voice.
pub const SAMPLE_RATE: u32 = 16000;

/// Number of samples per audio frame sent over the wire.
///
/// 4096 samples at 16kHz is 256ms of audio per frame, matching the block
/// size the transcription backend expects.
pub const BLOCK_SIZE: usize = 4096;

/// Default WebSocket endpoint for real-time transcription.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/transcribe/realtime";

/// Default base URL for the lesson-generation HTTP endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Grace period after sending `eos` before the transport is closed.
///
/// Trailing final transcripts arrive during this window. The wait is
/// unconditional; it is not driven by an `eos_received` acknowledgement.
pub const EOS_GRACE: Duration = Duration::from_millis(500);

/// Delay before a reconnect attempt after a transport loss.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Maximum number of reconnect attempts per transport loss.
///
/// The counter resets after a successful reconnect. Zero disables
/// reconnection entirely.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 1;

/// Maximum time to wait for the peer's handshake acknowledgement.
///
/// "Connected" is defined by a `connected`/`config_updated` message, not by
/// the transport-level open; a silent peer must not hang `start()` forever.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum time `stop()` waits for the receive loop to drain after the
/// transport close. A peer that never answers the close handshake must not
/// stall shutdown.
pub const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Interval at which the capture loop drains the audio source.
///
/// 100ms keeps frame latency low without spinning.
pub const CAPTURE_POLL_INTERVAL: Duration = Duration::from_millis(100);
