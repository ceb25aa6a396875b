//! Real-time transcription session: socket, dispatch, orchestration.

pub mod dispatcher;
pub mod orchestrator;
pub mod reconnect;
pub mod socket;
