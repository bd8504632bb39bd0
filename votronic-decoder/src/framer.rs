//! Stream framer
//!
//! The display port sends fixed-size datagrams back to back with no terminator.
//! Frames are found by scanning for the preamble byte and cutting
//! [`FRAME_SIZE`] bytes from there:
//!
//! ```text
//!   noise..  AA mm bb bb ss ss cc cc f1 f2 f3 tt cm bs cs xx  AA mm ..
//!            |<------------------ FRAME_SIZE ---------------->|
//! ```
//!
//! The preamble is not escaped inside the payload, so once a frame start is
//! missed a payload byte equal to `0xAA` can be taken as the next preamble.

use crate::config::FramerConfig;
use crate::types::{RawFrame, FRAME_SIZE, PREAMBLE};
use bytes::{Buf, BytesMut};

/// Initial capacity of the accumulation buffer
const INITIAL_BUFFER_CAPACITY: usize = 4 * FRAME_SIZE;

/// Accumulates stream bytes and cuts them into frames
#[derive(Debug)]
pub struct StreamFramer {
    /// Bytes received but not yet emitted as part of a frame
    buffer: BytesMut,
    config: FramerConfig,
    /// Noise bytes skipped in front of extracted frames
    skipped_bytes: u64,
    /// Bytes discarded because the buffer cap was exceeded
    overflow_bytes: u64,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            skipped_bytes: 0,
            overflow_bytes: 0,
        }
    }

    /// Append a chunk and return an iterator over the frames now available
    ///
    /// Frames left unconsumed when the iterator is dropped stay buffered and are
    /// returned by the next call.
    ///
    /// # Example
    /// ```
    /// use votronic_decoder::StreamFramer;
    ///
    /// let mut framer = StreamFramer::new();
    /// let mut frame = [0u8; 16];
    /// frame[0] = 0xAA;
    ///
    /// assert_eq!(framer.submit(&frame[..10]).count(), 0);
    /// assert_eq!(framer.submit(&frame[10..]).count(), 1);
    /// ```
    pub fn submit(&mut self, bytes: &[u8]) -> Frames<'_> {
        self.push(bytes);
        Frames { framer: self }
    }

    /// Append a chunk without extracting frames
    ///
    /// The buffer cap is not applied here; complete frames in the chunk must
    /// survive until [`next_frame`](Self::next_frame) extracts them.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Extract the next complete frame, if the buffer holds one
    ///
    /// When no frame can be extracted the buffer cap is applied to what is left.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        let Some(start) = self.buffer.iter().position(|&b| b == PREAMBLE) else {
            self.enforce_cap();
            return None;
        };

        // Wait for the rest of the frame
        if self.buffer.len() - start < FRAME_SIZE {
            self.enforce_cap();
            return None;
        }

        if start > 0 {
            log::debug!("Skipping {} noise byte(s) before preamble", start);
            self.skipped_bytes += start as u64;
            self.buffer.advance(start);
        }

        let mut bytes = [0u8; FRAME_SIZE];
        self.buffer.copy_to_slice(&mut bytes);
        Some(RawFrame::from_array(bytes))
    }

    /// Number of bytes waiting in the buffer
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Noise bytes skipped so far
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Bytes dropped by the buffer cap so far
    pub fn overflow_bytes(&self) -> u64 {
        self.overflow_bytes
    }

    /// Discard everything buffered (counters are kept)
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn enforce_cap(&mut self) {
        let Some(cap) = self.config.buffer_cap() else {
            return;
        };
        if self.buffer.len() <= cap {
            return;
        }

        let excess = self.buffer.len() - cap;
        log::warn!(
            "Framer buffer exceeded {} bytes, dropping {} oldest byte(s)",
            cap,
            excess
        );
        self.buffer.advance(excess);
        self.overflow_bytes += excess as u64;
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames available after a [`StreamFramer::submit`] call
#[derive(Debug)]
pub struct Frames<'a> {
    framer: &'a mut StreamFramer,
}

impl Iterator for Frames<'_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_frame()
    }
}
