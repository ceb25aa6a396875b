//! Fixed-size framing for outgoing audio.
//!
//! Audio sources deliver reads of arbitrary length; the wire protocol sends
//! equal-size blocks. The chunker buffers the remainder between reads so
//! frame boundaries never depend on the platform's callback size.

use std::collections::VecDeque;

/// Accumulates samples and emits fixed-size frames.
#[derive(Debug)]
pub struct FrameChunker {
    block_size: usize,
    buffer: VecDeque<i16>,
}

impl FrameChunker {
    /// Create a chunker emitting frames of `block_size` samples.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            buffer: VecDeque::new(),
        }
    }

    /// Feed samples in; drain every complete frame out.
    pub fn push(&mut self, samples: &[i16]) -> Vec<Vec<i16>> {
        self.buffer.extend(samples.iter().copied());

        let mut frames = Vec::new();
        while self.buffer.len() >= self.block_size {
            frames.push(self.buffer.drain(..self.block_size).collect());
        }
        frames
    }

    /// Emit the buffered tail as a final short frame, if any.
    ///
    /// Called once on stream end so trailing audio is not silently dropped.
    pub fn flush(&mut self) -> Option<Vec<i16>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.drain(..).collect())
        }
    }

    /// Samples currently buffered awaiting a full frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
