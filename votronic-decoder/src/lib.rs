//! Votronic Display-Port Decoder Library
//!
//! Decodes the telemetry stream of Votronic MP430 Duo Digital solar charge
//! controllers. The controller's display port sends a 16-byte datagram roughly
//! once per second; this library finds those datagrams in an arbitrarily chunked
//! byte stream and turns them into typed records.
//!
//! # Architecture
//!
//! - [`StreamFramer`] cuts the byte stream into [`RawFrame`]s
//! - [`ChecksumVerifier`] checks the XOR checksum of a frame
//! - [`DatagramDecoder`] decodes a frame using the layout for its model id
//! - [`catalog`] holds the charge-mode and status-bit lookup tables
//! - [`Pipeline`] ties these together and forwards results to a [`Sink`]
//!
//! The library does NOT:
//! - Open serial ports or files
//! - Serialize records to any particular text format
//! - Parse command lines or environment variables
//!
//! All of that lives in the application layer (votronic-cli).
//!
//! # Example Usage
//!
//! ```
//! use votronic_decoder::{Output, Pipeline, PipelineConfig, RecordField, Result, Sink};
//!
//! struct Print;
//!
//! impl Sink for Print {
//!     fn emit(&mut self, output: Output<'_>) -> Result<()> {
//!         if let Output::Record(record) = output {
//!             println!("{} V", record.record().battery_voltage);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let config = PipelineConfig::new().exclude(RecordField::Timestamp);
//! let mut pipeline = Pipeline::new(config, Print);
//!
//! // Bytes arrive in whatever chunks the transport delivers
//! pipeline.on_bytes(&[0x00, 0xAA, 0xAA, 0x48, 0x05]).unwrap();
//! pipeline.on_bytes(&[0xC8, 0x05, 0x32, 0x00, 0x00, 0x00, 0x00, 0x19, 0x35, 0x03, 0x00, 0x37]).unwrap();
//!
//! assert_eq!(pipeline.stats().records, 1);
//! ```

// Public modules
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod decoder;
pub mod framer;
pub mod pipeline;
pub mod record;
pub mod types;

// Re-export main types for convenience
pub use catalog::{ChargeMode, StatusFlags};
pub use checksum::ChecksumVerifier;
pub use config::{
    ChecksumPolicy, CurrentScale, DecoderConfig, FramerConfig, PipelineConfig,
    DEFAULT_CURRENT_SCALE,
};
pub use decoder::{DatagramDecoder, ModelDecoder, MpxxxDecoder, MPXXX_MODEL_ID};
pub use framer::{Frames, StreamFramer};
pub use pipeline::{FnSink, Output, Pipeline, PipelineStats, Sink};
pub use record::{DecodedRecord, ExclusionSet, FilteredRecord, RecordField};
pub use types::{DecoderError, FixedPoint, RawFrame, Result, Timestamp, FRAME_SIZE, PREAMBLE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
