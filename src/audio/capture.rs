//! Live microphone capture using CPAL (Cross-Platform Audio Library).

use crate::audio::pcm;
use crate::audio::source::{AudioSource, AudioSourceConfig};
use crate::error::{LinguaError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only accessed from a single thread at a time
/// through the Mutex wrapper in CpalAudioSource. The stream methods are
/// called synchronously and don't cross thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Microphone capture at the configured sample rate, mono.
///
/// Tries an i16 stream first (PipeWire/PulseAudio convert transparently),
/// falling back to f32 with software conversion for devices that only
/// expose float formats. The realtime callback pushes blocks into an
/// unbounded channel; `read_samples` drains whatever has accumulated
/// without ever blocking the audio thread.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    tx: Sender<Vec<i16>>,
    rx: Receiver<Vec<i16>>,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Create a new CPAL audio source.
    ///
    /// # Arguments
    /// * `config` - Sample rate and optional device name. A missing name
    ///   uses the system default input device.
    ///
    /// # Errors
    /// Returns `AudioDeviceNotFound` if the named (or default) device does
    /// not exist.
    pub fn new(config: &AudioSourceConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = config.device.as_deref() {
            let devices = host
                .input_devices()
                .map_err(|e| LinguaError::AudioCapture {
                    message: format!("Failed to enumerate devices: {}", e),
                })?;

            let mut found_device = None;
            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    found_device = Some(dev);
                    break;
                }
            }

            found_device.ok_or_else(|| LinguaError::AudioDeviceNotFound {
                device: name.to_string(),
            })?
        } else {
            host.default_input_device()
                .ok_or_else(|| LinguaError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })?
        };

        let (tx, rx) = crossbeam_channel::unbounded();

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            tx,
            rx,
            sample_rate: config.sample_rate,
        })
    }

    /// List the names of all available audio input devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| LinguaError::AudioCapture {
                message: format!("Failed to enumerate input devices: {}", e),
            })?;

        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // Preferred: i16 mono at the session rate
        let tx = self.tx.clone();
        if let Ok(stream) = self.device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.to_vec());
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // Fallback: f32 with software conversion
        let tx = self.tx.clone();
        self.device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.send(pcm::to_pcm16(data));
                },
                err_callback,
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => LinguaError::Permission {
                    message: "input device unavailable (in use or access denied)".to_string(),
                },
                other => LinguaError::AudioCapture {
                    message: format!("Failed to build input stream: {}", other),
                },
            })
    }
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| LinguaError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| LinguaError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut stream_guard = self.stream.lock().map_err(|e| LinguaError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| LinguaError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        // Dropping the stream releases the device and the mic indicator.
        if let Some(sendable_stream) = stream_guard.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| LinguaError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let mut samples = Vec::new();
        for block in self.rx.try_iter() {
            samples.extend_from_slice(&block);
        }
        Ok(samples)
    }
}
