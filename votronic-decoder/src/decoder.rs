//! Datagram decoder
//!
//! Turns one complete [`RawFrame`] into a [`DecodedRecord`]. The layout used is
//! chosen by the frame's model id; ids without a registered layout fall back to
//! the MPxxx layout, which is the only one currently known.

use crate::catalog::{ChargeMode, StatusFlags, BATTERY_STATUS_BITS, CONTROLLER_STATUS_BITS};
use crate::checksum::ChecksumVerifier;
use crate::config::{CurrentScale, DecoderConfig};
use crate::record::DecodedRecord;
use crate::types::{FixedPoint, RawFrame, Timestamp};
use byteorder::{ByteOrder, LittleEndian};
use chrono::Utc;
use std::collections::HashMap;

/// Model id of the MP430 Duo Digital family (and the default layout)
pub const MPXXX_MODEL_ID: u8 = 0xAA;

/// Divisor for both voltage readings
pub const VOLTAGE_SCALE: u32 = 100;

/// Byte offsets of the MPxxx layout (offset 0 is the preamble)
mod layout {
    pub const MODEL_ID: usize = 1;
    pub const BATTERY_VOLTAGE: usize = 2;
    pub const SOLAR_VOLTAGE: usize = 4;
    pub const CHARGE_CURRENT: usize = 6;
    pub const RESERVED: usize = 8;
    pub const TEMPERATURE: usize = 11;
    pub const CHARGE_MODE: usize = 12;
    pub const BATTERY_STATUS: usize = 13;
    pub const CONTROLLER_STATUS: usize = 14;
}

/// One decoding layout for a controller model
pub trait ModelDecoder: Send + Sync {
    /// Short human-readable name used in logs
    fn name(&self) -> &'static str;

    /// Decode a frame, stamping the record with `timestamp`
    fn decode(&self, frame: &RawFrame, timestamp: Timestamp) -> DecodedRecord;
}

/// Layout of the MP430 Duo Digital display port
#[derive(Debug, Clone, Copy, Default)]
pub struct MpxxxDecoder {
    current_scale: CurrentScale,
}

impl MpxxxDecoder {
    pub fn new(current_scale: CurrentScale) -> Self {
        Self { current_scale }
    }

    fn read_i16(bytes: &[u8], offset: usize) -> i64 {
        LittleEndian::read_i16(&bytes[offset..offset + 2]) as i64
    }
}

impl ModelDecoder for MpxxxDecoder {
    fn name(&self) -> &'static str {
        "MPxxx"
    }

    fn decode(&self, frame: &RawFrame, timestamp: Timestamp) -> DecodedRecord {
        let bytes = frame.as_bytes();

        let battery_raw = Self::read_i16(bytes, layout::BATTERY_VOLTAGE);
        let current_raw = Self::read_i16(bytes, layout::CHARGE_CURRENT);
        let current_scale = self.current_scale.divisor();

        let battery_voltage = FixedPoint::new(battery_raw, VOLTAGE_SCALE);
        let solar_voltage =
            FixedPoint::new(Self::read_i16(bytes, layout::SOLAR_VOLTAGE), VOLTAGE_SCALE);
        let charge_current = FixedPoint::new(current_raw, current_scale);
        // i16 × i16 always fits in i64 and both scales are at most 100
        let charge_power =
            FixedPoint::new(battery_raw * current_raw, VOLTAGE_SCALE * current_scale);

        let mut reserved_flags = [0u8; 3];
        reserved_flags.copy_from_slice(&bytes[layout::RESERVED..layout::RESERVED + 3]);

        DecodedRecord {
            model_id: bytes[layout::MODEL_ID],
            battery_voltage,
            solar_voltage,
            charge_current,
            charge_power,
            controller_temperature: bytes[layout::TEMPERATURE] as i8,
            battery_status: StatusFlags::decode(bytes[layout::BATTERY_STATUS], &BATTERY_STATUS_BITS),
            controller_status: StatusFlags::decode(
                bytes[layout::CONTROLLER_STATUS],
                &CONTROLLER_STATUS_BITS,
            ),
            charge_mode: ChargeMode::from_raw(bytes[layout::CHARGE_MODE]),
            raw_hex: frame.to_hex(),
            timestamp,
            reserved_flags,
            checksum_valid: ChecksumVerifier::verify(frame),
        }
    }
}

/// The datagram decoder - dispatches frames to a model layout
pub struct DatagramDecoder {
    /// Layouts registered for specific model ids
    strategies: HashMap<u8, Box<dyn ModelDecoder>>,
    /// Layout used for every unregistered model id
    fallback: Box<dyn ModelDecoder>,
}

impl DatagramDecoder {
    /// Create a decoder with default settings
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default())
    }

    /// Create a decoder from configuration
    ///
    /// The MPxxx layout is registered for model id `0xAA` and also serves as the
    /// fallback for every other id.
    pub fn with_config(config: &DecoderConfig) -> Self {
        let mpxxx = MpxxxDecoder::new(config.current_scale);
        let mut strategies: HashMap<u8, Box<dyn ModelDecoder>> = HashMap::new();
        strategies.insert(MPXXX_MODEL_ID, Box::new(mpxxx));

        Self {
            strategies,
            fallback: Box::new(mpxxx),
        }
    }

    /// Register (or replace) the layout for a model id
    pub fn register(&mut self, model_id: u8, strategy: Box<dyn ModelDecoder>) {
        log::debug!("Registering layout {} for model 0x{:02X}", strategy.name(), model_id);
        self.strategies.insert(model_id, strategy);
    }

    /// Layout that will be used for `model_id`
    pub fn strategy_for(&self, model_id: u8) -> &dyn ModelDecoder {
        match self.strategies.get(&model_id) {
            Some(strategy) => strategy.as_ref(),
            None => {
                log::debug!(
                    "No layout for model 0x{:02X}, using {}",
                    model_id,
                    self.fallback.name()
                );
                self.fallback.as_ref()
            }
        }
    }

    /// Model ids with a registered layout, ascending
    pub fn supported_models(&self) -> Vec<u8> {
        let mut models: Vec<u8> = self.strategies.keys().copied().collect();
        models.sort_unstable();
        models
    }

    /// Decode a frame, stamping it with the current time
    pub fn decode(&self, frame: &RawFrame) -> DecodedRecord {
        self.decode_at(frame, Utc::now())
    }

    /// Decode a frame with an explicit timestamp
    ///
    /// # Arguments
    /// * `frame` - Complete datagram
    /// * `timestamp` - Capture time recorded on the result
    ///
    /// # Returns
    /// * `DecodedRecord` - decoding never fails; unknown values degrade to fallbacks
    pub fn decode_at(&self, frame: &RawFrame, timestamp: Timestamp) -> DecodedRecord {
        let strategy = self.strategy_for(frame.model_id());
        log::trace!("Decoding {} with {} layout", frame, strategy.name());
        strategy.decode(frame, timestamp)
    }
}

impl Default for DatagramDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FRAME_SIZE, PREAMBLE};
    use chrono::TimeZone;

    /// Frame with the reference values: 13.52 V, 14.80 V, 0.50 A, 25 °C, lead_gel
    fn reference_bytes() -> [u8; FRAME_SIZE] {
        let mut bytes = [
            PREAMBLE, 0xAA, 0x48, 0x05, 0xC8, 0x05, 0x32, 0x00, 0x00, 0x00, 0x00, 0x19, 0x35,
            0b0011, 0x00, 0x00,
        ];
        ChecksumVerifier::seal(&mut bytes);
        bytes
    }

    fn fixed_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_reference_frame() {
        let frame = RawFrame::new(reference_bytes()).unwrap();
        let record = DatagramDecoder::new().decode_at(&frame, fixed_time());

        assert_eq!(record.model_id, 0xAA);
        assert_eq!(record.battery_voltage.value(), 13.52);
        assert_eq!(record.solar_voltage.value(), 14.80);
        assert_eq!(record.charge_current.value(), 0.50);
        assert_eq!(record.charge_power.value(), 6.76);
        assert_eq!(record.controller_temperature, 25);
        assert_eq!(record.charge_mode, ChargeMode::LeadGel);
        assert_eq!(record.battery_status.labels(), &["i_phase", "u1_phase"]);
        assert!(record.controller_status.is_empty());
        assert_eq!(record.raw_hex, frame.to_hex());
        assert_eq!(record.timestamp, fixed_time());
        assert!(record.checksum_valid);
    }

    #[test]
    fn test_current_scale_defaults_to_hundredths() {
        // Guard against the ÷10 variant: raw 50 must read as 0.5 A, not 5 A
        let frame = RawFrame::new(reference_bytes()).unwrap();
        let record = DatagramDecoder::new().decode_at(&frame, fixed_time());
        assert_ne!(record.charge_current.value(), 5.0);
        assert_eq!(record.charge_current.scale, 100);
    }

    #[test]
    fn test_configured_tenths_scale() {
        let frame = RawFrame::new(reference_bytes()).unwrap();
        let config = DecoderConfig::new().with_current_scale(CurrentScale::Tenths);
        let record = DatagramDecoder::with_config(&config).decode_at(&frame, fixed_time());
        assert_eq!(record.charge_current.value(), 5.0);
    }

    #[test]
    fn test_negative_readings() {
        let mut bytes = reference_bytes();
        // -1.00 A charge current, -5 °C
        bytes[6..8].copy_from_slice(&(-100i16).to_le_bytes());
        bytes[11] = (-5i8) as u8;
        ChecksumVerifier::seal(&mut bytes);

        let frame = RawFrame::new(bytes).unwrap();
        let record = DatagramDecoder::new().decode_at(&frame, fixed_time());
        assert_eq!(record.charge_current.value(), -1.0);
        assert_eq!(record.controller_temperature, -5);
        assert_eq!(record.charge_power.value(), -13.52);
    }

    #[test]
    fn test_charge_power_at_extreme_readings() {
        let mut bytes = reference_bytes();
        bytes[2..4].copy_from_slice(&i16::MIN.to_le_bytes());
        bytes[6..8].copy_from_slice(&i16::MIN.to_le_bytes());
        ChecksumVerifier::seal(&mut bytes);

        let record = DatagramDecoder::new().decode_at(&RawFrame::new(bytes).unwrap(), fixed_time());
        assert_eq!(record.charge_power, FixedPoint::new(1 << 30, 10_000));
        assert_eq!(
            Some(record.charge_power),
            record.battery_voltage.checked_product(record.charge_current)
        );
    }

    #[test]
    fn test_unknown_model_falls_back_to_default_layout() {
        let mut bytes = reference_bytes();
        bytes[1] = 0x42;
        let frame = RawFrame::new(bytes).unwrap();

        let decoder = DatagramDecoder::new();
        assert_eq!(decoder.strategy_for(0x42).name(), "MPxxx");

        let record = decoder.decode_at(&frame, fixed_time());
        assert_eq!(record.model_id, 0x42);
        assert_eq!(record.battery_voltage.value(), 13.52);
        assert!(!record.checksum_valid);
    }

    #[test]
    fn test_registered_strategy_takes_precedence() {
        struct Blank;
        impl ModelDecoder for Blank {
            fn name(&self) -> &'static str {
                "blank"
            }
            fn decode(&self, frame: &RawFrame, timestamp: Timestamp) -> DecodedRecord {
                let mut record = MpxxxDecoder::default().decode(frame, timestamp);
                record.controller_temperature = 0;
                record
            }
        }

        let mut decoder = DatagramDecoder::new();
        decoder.register(0x10, Box::new(Blank));
        assert_eq!(decoder.supported_models(), vec![0x10, 0xAA]);

        let mut bytes = reference_bytes();
        bytes[1] = 0x10;
        let record = decoder.decode_at(&RawFrame::new(bytes).unwrap(), fixed_time());
        assert_eq!(record.controller_temperature, 0);
    }

    #[test]
    fn test_reserved_flags_retained() {
        let mut bytes = reference_bytes();
        bytes[8..11].copy_from_slice(&[0x01, 0x80, 0xFF]);
        let record = DatagramDecoder::new().decode_at(&RawFrame::new(bytes).unwrap(), fixed_time());
        assert_eq!(record.reserved_flags, [0x01, 0x80, 0xFF]);
    }
}
