//! Configuration file loading
//!
//! Everything here can also be given on the command line; values from the file
//! only fill in what the command line and environment leave unset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use votronic_decoder::{ChecksumPolicy, CurrentScale, ExclusionSet, PipelineConfig};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub output: OutputConfig,
    pub decoder: DecoderSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
    /// Read timeout; the reader simply retries when it expires
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baudrate: default_baudrate(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_port() -> String {
    "/dev/ttyAMA0".to_string()
}

fn default_baudrate() -> u32 {
    1020
}

fn default_timeout() -> u64 {
    1000
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print raw datagrams as hex instead of decoding them
    pub dump: bool,
    /// Record fields to leave out of the JSON output
    pub exclude: ExclusionSet,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderSection {
    pub current_scale: CurrentScale,
    pub checksum: ChecksumPolicy,
    pub max_buffer_len: Option<usize>,
}

impl AppConfig {
    /// Core pipeline configuration described by this file
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new()
            .with_dump(self.output.dump)
            .with_exclusions(self.output.exclude.clone())
            .with_checksum_policy(self.decoder.checksum)
            .with_current_scale(self.decoder.current_scale);
        config.framer.max_buffer_len = self.decoder.max_buffer_len;
        config
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    log::debug!("Loaded configuration from {:?}: {:?}", path, config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use votronic_decoder::RecordField;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [serial]
            port = "/dev/ttyUSB0"

            [output]
            exclude = ["datagram", "timestamp"]

            [decoder]
            current_scale = "tenths"
            checksum = "reject"
            max_buffer_len = 4096
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baudrate, 1020);
        assert!(!config.output.dump);
        assert!(config.output.exclude.contains(RecordField::RawHex));
        assert_eq!(config.decoder.current_scale, CurrentScale::Tenths);

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.checksum, ChecksumPolicy::Reject);
        assert_eq!(pipeline.exclusions.len(), 2);
        assert_eq!(pipeline.framer.max_buffer_len, Some(4096));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.timeout_ms, 1000);
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn test_unknown_exclude_field_is_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str(
            r#"
            [output]
            exclude = ["wattage"]
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndump = true").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.output.dump);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/votronic.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
