//! JSON-lines output
//!
//! One line per datagram: the raw hex in dump mode, otherwise a JSON object.

use std::io::Write;
use votronic_decoder::{DecoderError, Output, Result, Sink};

/// Writes pipeline output as JSON lines
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn emit(&mut self, output: Output<'_>) -> Result<()> {
        match output {
            Output::Hex(hex) => writeln!(self.writer, "{}", hex)?,
            Output::Record(record) => {
                serde_json::to_writer(&mut self.writer, &record)
                    .map_err(|e| DecoderError::Sink(format!("Failed to serialize record: {}", e)))?;
                writeln!(self.writer)?;
            }
        }
        // Consumers tail this line by line
        self.writer.flush()?;
        Ok(())
    }
}
