//! Core types for the Votronic display-port decoder
//!
//! This module defines the wire-level frame type, the fixed-point value type used
//! for electrical readings and the error type shared by the whole library.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Size of one display-port datagram in bytes
pub const FRAME_SIZE: usize = 16;

/// Marker byte that starts every datagram
pub const PREAMBLE: u8 = 0xAA;

/// Errors that can occur while configuring or driving the decoder
///
/// Stream anomalies (noise, unknown models, unknown charge modes, bad checksums)
/// are never errors; they degrade to fallback values instead.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Unknown record field: {0}")]
    UnknownField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One complete display-port datagram
///
/// Always exactly [`FRAME_SIZE`] bytes long and always starting with [`PREAMBLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawFrame([u8; FRAME_SIZE]);

impl RawFrame {
    /// Wrap bytes the framer already located at a preamble
    pub(crate) fn from_array(bytes: [u8; FRAME_SIZE]) -> Self {
        debug_assert_eq!(bytes[0], PREAMBLE);
        Self(bytes)
    }

    /// Validate and wrap a complete datagram
    pub fn new(bytes: [u8; FRAME_SIZE]) -> Result<Self> {
        if bytes[0] != PREAMBLE {
            return Err(DecoderError::InvalidFrame(format!(
                "expected preamble 0x{:02X}, found 0x{:02X}",
                PREAMBLE, bytes[0]
            )));
        }
        Ok(Self(bytes))
    }

    /// All bytes of the frame, preamble included
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    /// Model identifier (second byte) used to select the decoding layout
    pub fn model_id(&self) -> u8 {
        self.0[1]
    }

    /// Lowercase hex encoding of the whole frame
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = DecoderError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; FRAME_SIZE] = bytes.try_into().map_err(|_| {
            DecoderError::InvalidFrame(format!(
                "expected {} bytes, got {}",
                FRAME_SIZE,
                bytes.len()
            ))
        })?;
        Self::new(array)
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Signed decimal fixed-point value: `raw / scale`
///
/// Readings are kept as the integers the controller sent so that no precision is
/// invented or lost; conversion to floating point happens once, on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedPoint {
    /// Integer value as transmitted
    pub raw: i64,
    /// Divisor applied to `raw` (a power of ten)
    pub scale: u32,
}

impl FixedPoint {
    pub const fn new(raw: i64, scale: u32) -> Self {
        Self { raw, scale }
    }

    /// Physical value as a float
    pub fn value(&self) -> f64 {
        self.raw as f64 / self.scale as f64
    }

    /// Exact product of two fixed-point values (scales multiply)
    ///
    /// Returns `None` if either the raw value or the scale overflows.
    pub fn checked_product(self, other: FixedPoint) -> Option<FixedPoint> {
        Some(FixedPoint {
            raw: self.raw.checked_mul(other.raw)?,
            scale: self.scale.checked_mul(other.scale)?,
        })
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:.2}", self.value()))
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}
