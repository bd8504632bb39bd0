//! Decoding pipeline
//!
//! Wires the framer, the decoder and the exclusion filter together and hands
//! every result to a [`Sink`]. The pipeline is synchronous and owns all of its
//! state; feed it chunks in arrival order with [`Pipeline::on_bytes`].

use crate::checksum::ChecksumVerifier;
use crate::config::{ChecksumPolicy, PipelineConfig};
use crate::decoder::DatagramDecoder;
use crate::framer::StreamFramer;
use crate::record::FilteredRecord;
use crate::types::{RawFrame, Result};

/// One item handed to the sink
#[derive(Debug, Clone, Copy)]
pub enum Output<'a> {
    /// Dump mode: lowercase hex of the raw frame
    Hex(&'a str),
    /// Parse mode: decoded record minus excluded fields
    Record(FilteredRecord<'a>),
}

/// Destination for pipeline output
pub trait Sink {
    fn emit(&mut self, output: Output<'_>) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, output: Output<'_>) -> Result<()> {
        (**self).emit(output)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn emit(&mut self, output: Output<'_>) -> Result<()> {
        (**self).emit(output)
    }
}

/// Adapter that turns a closure into a [`Sink`]
///
/// ```
/// use votronic_decoder::{FnSink, Output, Pipeline, PipelineConfig};
///
/// let mut lines = Vec::new();
/// let sink = FnSink::new(|output| {
///     if let Output::Hex(hex) = output {
///         lines.push(hex.to_string());
///     }
///     Ok(())
/// });
/// let mut pipeline = Pipeline::new(PipelineConfig::new().with_dump(true), sink);
/// pipeline.on_bytes(&[0xAA; 16]).unwrap();
/// drop(pipeline);
/// assert_eq!(lines, vec!["aa".repeat(16)]);
/// ```
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: FnMut(Output<'_>) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Sink for FnSink<F>
where
    F: FnMut(Output<'_>) -> Result<()>,
{
    fn emit(&mut self, output: Output<'_>) -> Result<()> {
        (self.0)(output)
    }
}

/// Counters collected while processing a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Complete frames extracted from the stream
    pub frames: u64,
    /// Decoded records handed to the sink
    pub records: u64,
    /// Hex dumps handed to the sink
    pub dumps: u64,
    /// Frames whose checksum did not match
    pub checksum_failures: u64,
    /// Frames dropped by [`ChecksumPolicy::Reject`]
    pub rejected_frames: u64,
    /// Noise bytes skipped between frames
    pub skipped_bytes: u64,
    /// Bytes dropped by the framer buffer cap
    pub overflow_bytes: u64,
}

/// Framer + decoder + filter, feeding a sink
pub struct Pipeline<S: Sink> {
    config: PipelineConfig,
    framer: StreamFramer,
    decoder: DatagramDecoder,
    sink: S,
    stats: PipelineStats,
}

impl<S: Sink> Pipeline<S> {
    /// Build a pipeline; the configuration is fixed for its whole lifetime
    pub fn new(config: PipelineConfig, sink: S) -> Self {
        let framer = StreamFramer::with_config(config.framer.clone());
        let decoder = DatagramDecoder::with_config(&config.decoder);
        log::debug!(
            "Pipeline ready (dump: {}, excluded fields: {}, checksum: {:?})",
            config.dump,
            config.exclusions.len(),
            config.checksum
        );
        Self {
            config,
            framer,
            decoder,
            sink,
            stats: PipelineStats::default(),
        }
    }

    /// Feed one chunk of stream bytes
    ///
    /// Every frame completed by this chunk is emitted before returning. The only
    /// error is a sink error; frames after the failing one stay buffered.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.framer.push(bytes);
        while let Some(frame) = self.framer.next_frame() {
            self.process_frame(&frame)?;
        }
        Ok(())
    }

    fn process_frame(&mut self, frame: &RawFrame) -> Result<()> {
        self.stats.frames += 1;

        if self.config.dump {
            let hex = frame.to_hex();
            self.sink.emit(Output::Hex(&hex))?;
            self.stats.dumps += 1;
            return Ok(());
        }

        if !self.accept_checksum(frame) {
            return Ok(());
        }

        let record = self.decoder.decode(frame);
        self.sink
            .emit(Output::Record(record.filtered(&self.config.exclusions)))?;
        self.stats.records += 1;
        Ok(())
    }

    /// Apply the checksum policy; false means drop the frame
    fn accept_checksum(&mut self, frame: &RawFrame) -> bool {
        if self.config.checksum == ChecksumPolicy::Ignore || ChecksumVerifier::verify(frame) {
            return true;
        }

        self.stats.checksum_failures += 1;
        match self.config.checksum {
            ChecksumPolicy::Reject => {
                log::warn!("Checksum mismatch, dropping frame {}", frame);
                self.stats.rejected_frames += 1;
                false
            }
            _ => {
                log::warn!("Checksum mismatch in frame {}", frame);
                true
            }
        }
    }

    /// Counters so far
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            skipped_bytes: self.framer.skipped_bytes(),
            overflow_bytes: self.framer.overflow_bytes(),
            ..self.stats
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Bytes waiting for the rest of a frame
    pub fn buffered_len(&self) -> usize {
        self.framer.buffered_len()
    }

    /// Consume the pipeline and return its sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
