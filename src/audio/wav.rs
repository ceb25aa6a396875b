//! WAV file audio source for pipe mode.

use crate::audio::source::AudioSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{LinguaError, Result};
use std::io::Read;

/// Audio source that reads from WAV file data.
/// Supports arbitrary sample rates and channels, resampling to the session
/// rate (16kHz mono).
pub struct WavAudioSource {
    samples: Vec<i16>,
    position: usize,
    chunk_size: usize,
}

impl WavAudioSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| LinguaError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LinguaError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Mix to mono if stereo
        let mono_samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        let samples = if source_rate != SAMPLE_RATE {
            resample(&mono_samples, source_rate, SAMPLE_RATE)
        } else {
            mono_samples
        };

        // 100ms reads at 16kHz; the chunker reframes to wire blocks
        let chunk_size = 1600;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
        })
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| LinguaError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = src_pos as usize;
            let frac = src_pos - idx as f64;

            if idx + 1 < samples.len() {
                let a = samples[idx] as f64;
                let b = samples[idx + 1] as f64;
                (a + (b - a) * frac) as i16
            } else if idx < samples.len() {
                samples[idx]
            } else {
                0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn mono_spec(sample_rate: u32) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_reads_16khz_mono_unchanged() {
        let samples: Vec<i16> = (0..3200).map(|i| (i % 100) as i16).collect();
        let bytes = wav_bytes(mono_spec(16000), &samples);

        let source =
            WavAudioSource::from_reader(Box::new(Cursor::new(bytes))).expect("should parse");
        assert_eq!(source.into_samples(), samples);
    }

    #[test]
    fn test_stereo_mixed_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        // L=100, R=300 -> 200
        let bytes = wav_bytes(spec, &[100, 300, 100, 300]);

        let source =
            WavAudioSource::from_reader(Box::new(Cursor::new(bytes))).expect("should parse");
        assert_eq!(source.into_samples(), vec![200i16, 200]);
    }

    #[test]
    fn test_resamples_to_16khz() {
        let samples = vec![0i16; 48000]; // 1 second at 48kHz
        let bytes = wav_bytes(mono_spec(48000), &samples);

        let source =
            WavAudioSource::from_reader(Box::new(Cursor::new(bytes))).expect("should parse");
        let resampled = source.into_samples();
        assert_eq!(resampled.len(), 16000);
    }

    #[test]
    fn test_reads_in_chunks_until_exhausted() {
        let samples = vec![1i16; 2000];
        let bytes = wav_bytes(mono_spec(16000), &samples);

        let mut source =
            WavAudioSource::from_reader(Box::new(Cursor::new(bytes))).expect("should parse");
        assert!(source.is_finite());

        let first = source.read_samples().unwrap();
        assert_eq!(first.len(), 1600);
        let second = source.read_samples().unwrap();
        assert_eq!(second.len(), 400);
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn test_garbage_input_is_capture_error() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(vec![0u8; 16])));
        match result {
            Err(LinguaError::AudioCapture { message }) => {
                assert!(message.contains("WAV"));
            }
            other => panic!("Expected AudioCapture error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![5i16, 10, 15];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsamples_by_ratio() {
        let samples: Vec<i16> = (0..32000).map(|i| (i % 128) as i16).collect();
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 16000);
    }
}
