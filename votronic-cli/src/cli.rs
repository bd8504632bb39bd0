//! Command-line arguments
//!
//! Precedence: command line > `VOTRONIC_*` environment > config file > defaults.

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;
use votronic_decoder::{ChecksumPolicy, CurrentScale, RecordField};

/// Read the display port of a Votronic MP430 Duo Digital solar regulator and print JSON
#[derive(Parser, Debug)]
#[command(name = "votronic")]
#[command(about = "Read Votronic solar regulator telemetry and output it as JSON lines", long_about = None)]
#[command(version)]
pub struct Args {
    /// Serial port [default: /dev/ttyAMA0]
    #[arg(short, long, env = "VOTRONIC_PORT")]
    pub port: Option<String>,

    /// Serial baudrate [default: 1020]
    #[arg(short, long, env = "VOTRONIC_BAUDRATE")]
    pub baudrate: Option<u32>,

    /// Dump raw datagrams as hex instead of parsing them
    #[arg(short = 'D', long, env = "VOTRONIC_DUMP", overrides_with = "parse")]
    pub dump: bool,

    /// Parse datagrams (default)
    #[arg(short = 'P', long, overrides_with = "dump")]
    pub parse: bool,

    /// Exclude a field from the output (repeat or comma-separate for several)
    #[arg(short, long, value_name = "FIELD", env = "VOTRONIC_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<RecordField>,

    /// Read a captured byte stream from FILE ("-" for stdin) instead of the serial port
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Charge-current divisor: 100 or 10
    #[arg(long, value_name = "SCALE")]
    pub current_scale: Option<CurrentScale>,

    /// Checksum handling: ignore, warn or reject
    #[arg(long, value_name = "POLICY")]
    pub checksum: Option<ChecksumPolicy>,

    /// Drop the oldest buffered bytes beyond this many
    #[arg(long, value_name = "BYTES")]
    pub max_buffer: Option<usize>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Overlay the values given on the command line onto a file configuration
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baudrate) = self.baudrate {
            config.serial.baudrate = baudrate;
        }
        if self.dump {
            config.output.dump = true;
        } else if self.parse {
            config.output.dump = false;
        }
        if !self.exclude.is_empty() {
            config.output.exclude = self.exclude.iter().copied().collect();
        }
        if let Some(scale) = self.current_scale {
            config.decoder.current_scale = scale;
        }
        if let Some(policy) = self.checksum {
            config.decoder.checksum = policy;
        }
        if let Some(max_buffer) = self.max_buffer {
            config.decoder.max_buffer_len = Some(max_buffer);
        }
        config
    }
}
