//! Field catalog: lookup tables for enumerated and bitfield values
//!
//! Every label the decoder can emit is declared here. Decoding code never
//! compares against inline masks; it walks these tables instead.

use serde::{Serialize, Serializer};
use std::fmt;

/// Bit 7 of the charge-mode byte is reserved and ignored for the lookup
pub const CHARGE_MODE_MASK: u8 = 0b0111_1111;

/// Battery chemistry / charge profile reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargeMode {
    LeadGel,
    LeadAgm1,
    LeadAgm2,
    /// LiFePO4 profile with its absorption voltage in centivolts
    LiFePo4 { centivolts: u16 },
    /// Code missing from [`CHARGE_MODES`] (already masked)
    Unknown(u8),
}

/// Known charge-mode codes, after masking with [`CHARGE_MODE_MASK`]
pub const CHARGE_MODES: [(u8, ChargeMode); 8] = [
    (0x35, ChargeMode::LeadGel),
    (0x22, ChargeMode::LeadAgm1),
    (0x2F, ChargeMode::LeadAgm2),
    (0x50, ChargeMode::LiFePo4 { centivolts: 1390 }),
    (0x52, ChargeMode::LiFePo4 { centivolts: 1420 }),
    (0x54, ChargeMode::LiFePo4 { centivolts: 1440 }),
    (0x56, ChargeMode::LiFePo4 { centivolts: 1460 }),
    (0x58, ChargeMode::LiFePo4 { centivolts: 1480 }),
];

impl ChargeMode {
    /// Look up the raw charge-mode byte; unknown codes fall back to [`ChargeMode::Unknown`]
    pub fn from_raw(raw: u8) -> Self {
        let code = raw & CHARGE_MODE_MASK;
        CHARGE_MODES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, mode)| *mode)
            .unwrap_or(ChargeMode::Unknown(code))
    }

    /// True if the code was found in the catalog
    pub fn is_known(&self) -> bool {
        !matches!(self, ChargeMode::Unknown(_))
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargeMode::LeadGel => write!(f, "lead_gel"),
            ChargeMode::LeadAgm1 => write!(f, "lead_agm1"),
            ChargeMode::LeadAgm2 => write!(f, "lead_agm2"),
            ChargeMode::LiFePo4 { centivolts } => {
                write!(f, "lifepo4_{}.{}V", centivolts / 100, (centivolts % 100) / 10)
            }
            ChargeMode::Unknown(code) => write!(f, "unknown: {}", code),
        }
    }
}

impl Serialize for ChargeMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Declarative bit -> label table
pub type BitTable = [(u8, &'static str)];

/// Battery status byte, low nibble. Each bit is an independent charge phase flag.
pub const BATTERY_STATUS_BITS: [(u8, &str); 4] = [
    (0b0000_0001, "i_phase"),
    (0b0000_0010, "u1_phase"),
    (0b0000_0100, "u2_phase"),
    (0b0000_1000, "u3_phase"),
];

/// Controller status byte. `unknownN` labels are placeholders for bits whose
/// meaning has not been established yet.
pub const CONTROLLER_STATUS_BITS: [(u8, &str); 8] = [
    (0b1000_0000, "unknown8"),
    (0b0100_0000, "unknown7"),
    (0b0010_0000, "unknown6"),
    (0b0001_0000, "charged_over80percent"),
    (0b0000_1000, "unknown4"),
    (0b0000_0100, "unknown3"),
    (0b0000_0010, "unknown2"),
    (0b0000_0001, "unknown1"),
];

/// Set of named flags decoded from one status byte
///
/// Labels keep the order of the table they were decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFlags {
    raw: u8,
    labels: Vec<&'static str>,
}

impl StatusFlags {
    /// Decode `raw` against a bit table; bits not in the table are ignored
    pub fn decode(raw: u8, table: &BitTable) -> Self {
        let labels = table
            .iter()
            .filter(|(mask, _)| raw & mask != 0)
            .map(|(_, label)| *label)
            .collect();
        Self { raw, labels }
    }

    /// The status byte as received
    pub fn raw(&self) -> u8 {
        self.raw
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| *l == label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Serialize for StatusFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.labels.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_charge_modes() {
        assert_eq!(ChargeMode::from_raw(0x35).to_string(), "lead_gel");
        assert_eq!(ChargeMode::from_raw(0x22).to_string(), "lead_agm1");
        assert_eq!(ChargeMode::from_raw(0x2F).to_string(), "lead_agm2");
        assert_eq!(ChargeMode::from_raw(0x50).to_string(), "lifepo4_13.9V");
        assert_eq!(ChargeMode::from_raw(0x52).to_string(), "lifepo4_14.2V");
        assert_eq!(ChargeMode::from_raw(0x54).to_string(), "lifepo4_14.4V");
        assert_eq!(ChargeMode::from_raw(0x56).to_string(), "lifepo4_14.6V");
        assert_eq!(ChargeMode::from_raw(0x58).to_string(), "lifepo4_14.8V");
    }

    #[test]
    fn test_charge_mode_ignores_top_bit() {
        assert_eq!(ChargeMode::from_raw(0x80 | 0x35), ChargeMode::LeadGel);
        assert_eq!(ChargeMode::from_raw(0xD8), ChargeMode::LiFePo4 { centivolts: 1480 });
    }

    #[test]
    fn test_unknown_charge_mode_fallback() {
        for raw in [0x00u8, 0x11, 0x7F, 0xFF] {
            let mode = ChargeMode::from_raw(raw);
            let masked = raw & CHARGE_MODE_MASK;
            if CHARGE_MODES.iter().any(|(code, _)| *code == masked) {
                continue;
            }
            assert!(!mode.is_known());
            assert_eq!(mode.to_string(), format!("unknown: {}", masked));
        }
    }

    #[test]
    fn test_battery_status_is_a_set() {
        let flags = StatusFlags::decode(0b0011, &BATTERY_STATUS_BITS);
        assert_eq!(flags.labels(), &["i_phase", "u1_phase"]);
        assert!(flags.contains("u1_phase"));
        assert!(!flags.contains("u2_phase"));

        let all = StatusFlags::decode(0xFF, &BATTERY_STATUS_BITS);
        assert_eq!(all.labels().len(), 4);
        assert_eq!(all.raw(), 0xFF);

        assert!(StatusFlags::decode(0xF0, &BATTERY_STATUS_BITS).is_empty());
    }

    #[test]
    fn test_controller_status_placeholders() {
        let flags = StatusFlags::decode(0b1001_0001, &CONTROLLER_STATUS_BITS);
        assert_eq!(flags.labels(), &["unknown8", "charged_over80percent", "unknown1"]);
    }
}
