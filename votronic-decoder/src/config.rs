//! Decoder configuration types
//!
//! Configuration is an immutable value built once (usually by the application
//! layer from CLI flags and a config file) and handed to the [`Pipeline`] at
//! construction time.
//!
//! [`Pipeline`]: crate::pipeline::Pipeline

use crate::record::{ExclusionSet, RecordField};
use crate::types::{DecoderError, Result, FRAME_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Divisor applied to the raw charge-current reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentScale {
    /// Raw value is centiamperes (÷100)
    #[default]
    Hundredths,
    /// Raw value is deciamperes (÷10), seen in an older reader
    Tenths,
}

/// Charge-current scale used unless configured otherwise
pub const DEFAULT_CURRENT_SCALE: CurrentScale = CurrentScale::Hundredths;

impl CurrentScale {
    pub fn divisor(self) -> u32 {
        match self {
            CurrentScale::Hundredths => 100,
            CurrentScale::Tenths => 10,
        }
    }
}

impl FromStr for CurrentScale {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "100" | "hundredths" => Ok(CurrentScale::Hundredths),
            "10" | "tenths" => Ok(CurrentScale::Tenths),
            other => Err(DecoderError::InvalidConfig(format!(
                "unknown current scale '{}' (expected 100 or 10)",
                other
            ))),
        }
    }
}

impl fmt::Display for CurrentScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.divisor())
    }
}

/// What to do with frames whose XOR checksum does not match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Do not act on the checksum; records still report it in `checksum_valid`
    Ignore,
    /// Log and count mismatches, still emit the record
    #[default]
    Warn,
    /// Count mismatches and drop the frame
    Reject,
}

impl FromStr for ChecksumPolicy {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ChecksumPolicy::Ignore),
            "warn" => Ok(ChecksumPolicy::Warn),
            "reject" => Ok(ChecksumPolicy::Reject),
            other => Err(DecoderError::InvalidConfig(format!(
                "unknown checksum policy '{}' (expected ignore, warn or reject)",
                other
            ))),
        }
    }
}

/// Configuration for the datagram decoder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Divisor for the charge-current field
    pub current_scale: CurrentScale,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the charge-current scale
    pub fn with_current_scale(mut self, scale: CurrentScale) -> Self {
        self.current_scale = scale;
        self
    }
}

/// Configuration for the stream framer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramerConfig {
    /// Upper bound on buffered bytes; oldest bytes are dropped beyond it.
    /// `None` keeps everything until a frame can be extracted.
    pub max_buffer_len: Option<usize>,
}

impl FramerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: cap the accumulation buffer
    pub fn with_max_buffer_len(mut self, len: usize) -> Self {
        self.max_buffer_len = Some(len);
        self
    }

    /// Effective cap; never smaller than one frame
    pub fn buffer_cap(&self) -> Option<usize> {
        self.max_buffer_len.map(|len| len.max(FRAME_SIZE))
    }
}

/// Complete configuration of a [`Pipeline`](crate::pipeline::Pipeline)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Forward raw hex instead of decoding
    pub dump: bool,
    /// Fields removed from decoded records
    pub exclusions: ExclusionSet,
    /// Checksum handling for decoded frames
    pub checksum: ChecksumPolicy,
    pub decoder: DecoderConfig,
    pub framer: FramerConfig,
}

impl PipelineConfig {
    /// Create a new pipeline configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable dump mode
    pub fn with_dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }

    /// Builder method: replace the exclusion set
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Builder method: exclude one more field
    pub fn exclude(mut self, field: RecordField) -> Self {
        self.exclusions = self.exclusions.iter().chain(Some(field)).collect();
        self
    }

    /// Builder method: set the checksum policy
    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum = policy;
        self
    }

    /// Builder method: set the charge-current scale
    pub fn with_current_scale(mut self, scale: CurrentScale) -> Self {
        self.decoder.current_scale = scale;
        self
    }

    /// Builder method: cap the framer buffer
    pub fn with_max_buffer_len(mut self, len: usize) -> Self {
        self.framer.max_buffer_len = Some(len);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_builder() {
        let config = PipelineConfig::new()
            .with_dump(true)
            .exclude(RecordField::Timestamp)
            .exclude(RecordField::RawHex)
            .with_checksum_policy(ChecksumPolicy::Reject)
            .with_current_scale(CurrentScale::Tenths)
            .with_max_buffer_len(4096);

        assert!(config.dump);
        assert_eq!(config.exclusions.len(), 2);
        assert_eq!(config.checksum, ChecksumPolicy::Reject);
        assert_eq!(config.decoder.current_scale.divisor(), 10);
        assert_eq!(config.framer.max_buffer_len, Some(4096));
    }

    #[test]
    fn test_defaults_preserve_lenient_behavior() {
        let config = PipelineConfig::default();
        assert!(!config.dump);
        assert!(config.exclusions.is_empty());
        assert_eq!(config.checksum, ChecksumPolicy::Warn);
        assert_eq!(config.decoder.current_scale, DEFAULT_CURRENT_SCALE);
        assert_eq!(DEFAULT_CURRENT_SCALE.divisor(), 100);
        assert_eq!(config.framer.buffer_cap(), None);
    }

    #[test]
    fn test_buffer_cap_never_below_frame_size() {
        let framer = FramerConfig::new().with_max_buffer_len(3);
        assert_eq!(framer.buffer_cap(), Some(FRAME_SIZE));
    }

    #[test]
    fn test_parse_current_scale_and_policy() {
        assert_eq!("100".parse::<CurrentScale>().unwrap(), CurrentScale::Hundredths);
        assert_eq!("Tenths".parse::<CurrentScale>().unwrap(), CurrentScale::Tenths);
        assert!("1000".parse::<CurrentScale>().is_err());

        assert_eq!("REJECT".parse::<ChecksumPolicy>().unwrap(), ChecksumPolicy::Reject);
        assert!("strict".parse::<ChecksumPolicy>().is_err());
    }
}
