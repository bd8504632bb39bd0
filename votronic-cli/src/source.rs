//! Byte sources: serial port, capture file or stdin
//!
//! The decoder does not care where bytes come from; this module opens the
//! configured source and pumps it into a pipeline until end of input.

use anyhow::{Context, Result};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::PathBuf;
use std::time::Duration;
use votronic_decoder::{Pipeline, Sink};

use crate::config::SerialConfig;

/// Size of a single read from the source
const READ_CHUNK_SIZE: usize = 256;

/// Where telemetry bytes are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Serial(SerialConfig),
    File(PathBuf),
    Stdin,
}

impl Source {
    /// Pick the source: an explicit input path wins over the serial port
    pub fn select(input: Option<PathBuf>, serial: &SerialConfig) -> Self {
        match input {
            Some(path) if path.as_os_str() == "-" => Source::Stdin,
            Some(path) => Source::File(path),
            None => Source::Serial(serial.clone()),
        }
    }

    /// Open the source for reading
    pub fn open(&self) -> Result<Box<dyn Read>> {
        match self {
            Source::Serial(serial) => {
                log::info!("Opening serial port {} at {} baud", serial.port, serial.baudrate);
                // Display port is 8N1 without flow control
                let port = serialport::new(serial.port.as_str(), serial.baudrate)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .flow_control(FlowControl::None)
                    .timeout(Duration::from_millis(serial.timeout_ms))
                    .open()
                    .with_context(|| format!("Failed to open serial port {}", serial.port))?;
                Ok(Box::new(port))
            }
            Source::File(path) => {
                log::info!("Reading captured stream from {:?}", path);
                let file = File::open(path)
                    .with_context(|| format!("Failed to open input file: {:?}", path))?;
                Ok(Box::new(file))
            }
            Source::Stdin => {
                log::info!("Reading captured stream from stdin");
                Ok(Box::new(io::stdin()))
            }
        }
    }
}

/// Read `reader` to the end, feeding every chunk to `pipeline`
///
/// Read timeouts are not errors: a quiet serial line simply yields no data.
/// Returns the number of bytes read.
pub fn pump<R: Read, S: Sink>(mut reader: R, pipeline: &mut Pipeline<S>) -> Result<u64> {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                total += n as u64;
                log::trace!("Read {} byte(s)", n);
                pipeline
                    .on_bytes(&buf[..n])
                    .context("Failed to write output")?;
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                continue;
            }
            Err(e) => return Err(e).context("Failed to read from source"),
        }
    }

    log::debug!("End of input after {} byte(s)", total);
    Ok(total)
}
