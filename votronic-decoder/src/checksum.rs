//! XOR checksum of display-port datagrams
//!
//! The last byte of a datagram is chosen so that the XOR of every byte after the
//! preamble is zero.

use crate::types::{RawFrame, FRAME_SIZE};

/// Checksum verifier - pure functions over a single frame
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// XOR of all bytes except the preamble (checksum byte included)
    pub fn checksum(frame: &RawFrame) -> u8 {
        Self::xor(&frame.as_bytes()[1..])
    }

    /// True if the frame's checksum byte matches its payload
    pub fn verify(frame: &RawFrame) -> bool {
        Self::checksum(frame) == 0
    }

    /// Write the checksum byte for `bytes[1..FRAME_SIZE - 1]` into the last position
    pub fn seal(bytes: &mut [u8; FRAME_SIZE]) {
        bytes[FRAME_SIZE - 1] = Self::xor(&bytes[1..FRAME_SIZE - 1]);
    }

    fn xor(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0, |acc, b| acc ^ b)
    }
}
