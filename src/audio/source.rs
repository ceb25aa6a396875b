use crate::defaults;
use crate::error::{LinguaError, Result};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device, WAV file,
/// or mock).
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    ///
    /// Calling start on an already-started source is a no-op.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio and release the device.
    ///
    /// Idempotent: stopping an unstarted source is a no-op.
    fn stop(&mut self) -> Result<()>;

    /// Drain all samples captured since the last read.
    ///
    /// # Returns
    /// Vector of 16-bit PCM audio samples; empty when nothing new arrived.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// True when the source will never produce more samples (file sources).
    /// Live microphone sources return false.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Configuration for audio source initialization
#[derive(Debug, Clone)]
pub struct AudioSourceConfig {
    pub sample_rate: u32,
    pub device: Option<String>,
}

impl Default for AudioSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            device: None,
        }
    }
}

/// Mock audio source for testing
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    samples: Vec<i16>,
    drained: bool,
    finite: bool,
    should_fail_start: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with default settings
    pub fn new() -> Self {
        Self {
            is_started: false,
            samples: vec![0i16; 160],
            drained: false,
            finite: false,
            should_fail_start: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to return specific samples on every read
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self
    }

    /// Configure the mock to return its samples exactly once, then report
    /// exhaustion like a file source.
    pub fn finite(mut self) -> Self {
        self.finite = true;
        self
    }

    /// Configure the mock to fail on start with a permission error
    pub fn with_permission_failure(mut self, message: &str) -> Self {
        self.should_fail_start = true;
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(LinguaError::Permission {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.finite {
            if self.drained {
                return Ok(Vec::new());
            }
            self.drained = true;
        }
        Ok(self.samples.clone())
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
