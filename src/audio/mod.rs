//! Audio capture and PCM conversion.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod chunker;
pub mod pcm;
pub mod source;
pub mod wav;
