//! Float to 16-bit PCM conversion.
//!
//! The int16 range is asymmetric (-32768..=32767), so positive and negative
//! samples use different scale factors; a symmetric 32767 scale would never
//! reach full negative deflection, and 32768 would overflow at +1.0.

/// Convert one float sample in [-1, 1] to a signed 16-bit sample.
///
/// Values outside [-1, 1] are clamped first. Positive samples scale by
/// 32767, negative by 32768, rounding to nearest.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Convert a block of float samples to PCM16.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples.iter().copied().map(sample_to_i16).collect()
}

/// Serialize PCM16 samples as little-endian bytes for the wire.
pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}
