//! Decoded telemetry records and the field-exclusion filter
//!
//! A [`DecodedRecord`] is fully typed. Its serialized form is a flat map whose keys
//! are the [`RecordField`] names; [`FilteredRecord`] serializes the same map minus
//! the fields named in an [`ExclusionSet`].

use crate::catalog::{ChargeMode, StatusFlags};
use crate::types::{DecoderError, FixedPoint, Result, Timestamp};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One decoded datagram
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Model identifier byte
    pub model_id: u8,
    /// Battery voltage in volts
    pub battery_voltage: FixedPoint,
    /// Solar panel voltage in volts
    pub solar_voltage: FixedPoint,
    /// Charge current in amperes
    pub charge_current: FixedPoint,
    /// Charge power in watts (battery voltage × charge current)
    pub charge_power: FixedPoint,
    /// Controller temperature in °C
    pub controller_temperature: i8,
    /// Active battery charge phases
    pub battery_status: StatusFlags,
    /// Controller status flags
    pub controller_status: StatusFlags,
    pub charge_mode: ChargeMode,
    /// Lowercase hex of the complete frame
    pub raw_hex: String,
    /// When the frame was decoded
    pub timestamp: Timestamp,
    /// Reserved bytes 8..11, not interpreted
    pub reserved_flags: [u8; 3],
    /// Result of the XOR checksum check (informational)
    pub checksum_valid: bool,
}

impl DecodedRecord {
    /// View of this record that omits the excluded fields when serialized
    pub fn filtered<'a>(&'a self, exclusions: &'a ExclusionSet) -> FilteredRecord<'a> {
        FilteredRecord::new(self, exclusions)
    }

    fn serialize_field<M: SerializeMap>(&self, field: RecordField, map: &mut M) -> std::result::Result<(), M::Error> {
        let key = field.name();
        match field {
            RecordField::ModelId => map.serialize_entry(key, &format!("{:#04x}", self.model_id)),
            RecordField::BatteryVoltage => map.serialize_entry(key, &self.battery_voltage),
            RecordField::SolarVoltage => map.serialize_entry(key, &self.solar_voltage),
            RecordField::ChargeCurrent => map.serialize_entry(key, &self.charge_current),
            RecordField::ChargePower => map.serialize_entry(key, &self.charge_power),
            RecordField::ControllerTemperature => {
                map.serialize_entry(key, &self.controller_temperature)
            }
            RecordField::BatteryStatus => map.serialize_entry(key, &self.battery_status),
            RecordField::ControllerStatus => map.serialize_entry(key, &self.controller_status),
            RecordField::ChargeMode => map.serialize_entry(key, &self.charge_mode),
            RecordField::RawHex => map.serialize_entry(key, &self.raw_hex),
            RecordField::Timestamp => map.serialize_entry(key, &self.timestamp),
        }
    }
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let nothing = ExclusionSet::new();
        FilteredRecord::new(self, &nothing).serialize(serializer)
    }
}

/// Names of the serialized record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordField {
    ModelId,
    BatteryVoltage,
    SolarVoltage,
    ChargeCurrent,
    ChargePower,
    ControllerTemperature,
    BatteryStatus,
    ControllerStatus,
    ChargeMode,
    RawHex,
    Timestamp,
}

impl RecordField {
    /// All fields in output order
    pub const ALL: [RecordField; 11] = [
        RecordField::ModelId,
        RecordField::BatteryVoltage,
        RecordField::SolarVoltage,
        RecordField::ChargeCurrent,
        RecordField::ChargePower,
        RecordField::ControllerTemperature,
        RecordField::BatteryStatus,
        RecordField::ControllerStatus,
        RecordField::ChargeMode,
        RecordField::RawHex,
        RecordField::Timestamp,
    ];

    /// Key used in serialized output
    pub fn name(self) -> &'static str {
        match self {
            RecordField::ModelId => "model_id",
            RecordField::BatteryVoltage => "battery_voltage",
            RecordField::SolarVoltage => "solar_voltage",
            RecordField::ChargeCurrent => "charge_current",
            RecordField::ChargePower => "charge_power",
            RecordField::ControllerTemperature => "controller_temperature",
            RecordField::BatteryStatus => "battery_status",
            RecordField::ControllerStatus => "controller_status",
            RecordField::ChargeMode => "charge_mode",
            RecordField::RawHex => "raw_hex",
            RecordField::Timestamp => "timestamp",
        }
    }

    /// Field name used by earlier releases of the reader, still accepted on input
    pub fn legacy_name(self) -> &'static str {
        match self {
            RecordField::BatteryVoltage => "V_bat",
            RecordField::SolarVoltage => "V_solar",
            RecordField::ChargeCurrent => "I_charge",
            RecordField::ChargePower => "P_charge",
            RecordField::ControllerTemperature => "ctrl_temp",
            RecordField::BatteryStatus => "bat_status",
            RecordField::ControllerStatus => "ctrl_status",
            RecordField::RawHex => "datagram",
            other => other.name(),
        }
    }

    /// Case-insensitive lookup by current or legacy name
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|field| {
            field.name().eq_ignore_ascii_case(name) || field.legacy_name().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordField {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|f| f.name()).collect();
            DecoderError::UnknownField(format!("'{}' (expected one of: {})", s, known.join(", ")))
        })
    }
}

impl Serialize for RecordField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RecordField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Fields to omit from emitted records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet(BTreeSet<RecordField>);

impl ExclusionSet {
    /// Empty set - nothing excluded
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from user-supplied names, rejecting any unknown name
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<RecordField>())
            .collect()
    }

    pub fn contains(&self, field: RecordField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RecordField> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = RecordField>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A record paired with the exclusion set it should be emitted with
#[derive(Debug, Clone, Copy)]
pub struct FilteredRecord<'a> {
    record: &'a DecodedRecord,
    exclusions: &'a ExclusionSet,
}

impl<'a> FilteredRecord<'a> {
    pub fn new(record: &'a DecodedRecord, exclusions: &'a ExclusionSet) -> Self {
        Self { record, exclusions }
    }

    /// The full, unfiltered record
    pub fn record(&self) -> &'a DecodedRecord {
        self.record
    }

    /// Fields that will be serialized, in output order
    pub fn fields(&self) -> impl Iterator<Item = RecordField> + 'a {
        let exclusions = self.exclusions;
        RecordField::ALL
            .into_iter()
            .filter(move |field| !exclusions.contains(*field))
    }
}

impl Serialize for FilteredRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for field in self.fields() {
            self.record.serialize_field(field, &mut map)?;
        }
        map.end()
    }
}
