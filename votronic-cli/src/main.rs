//! Votronic Reader CLI Application
//!
//! Reads the display port of a Votronic MP430 Duo Digital solar regulator and
//! prints one JSON object per datagram on stdout. It uses the votronic-decoder
//! library and adds:
//! - Argument, environment and config-file handling
//! - Serial port / capture file input
//! - JSON-lines output
//!
//! Logs go to stderr so that stdout carries only data.

use anyhow::Result;
use clap::Parser;
use std::io;
use votronic_decoder::Pipeline;

mod cli;
mod config;
mod output;
mod source;

use cli::Args;
use config::AppConfig;
use output::JsonLinesSink;
use source::Source;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Votronic reader v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", votronic_decoder::VERSION);

    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    let app_config = args.apply(file_config);
    let pipeline_config = app_config.pipeline_config();
    log::debug!("Effective configuration: {:?}", pipeline_config);

    let source = Source::select(args.input.clone(), &app_config.serial);
    let reader = source.open()?;

    let sink = JsonLinesSink::new(io::stdout().lock());
    let mut pipeline = Pipeline::new(pipeline_config, sink);

    source::pump(reader, &mut pipeline)?;

    let stats = pipeline.stats();
    log::info!(
        "Processed {} frame(s): {} record(s), {} dump(s), {} checksum failure(s), {} rejected",
        stats.frames,
        stats.records,
        stats.dumps,
        stats.checksum_failures,
        stats.rejected_frames
    );
    if stats.skipped_bytes > 0 || stats.overflow_bytes > 0 {
        log::info!(
            "Discarded {} noise byte(s), {} byte(s) over the buffer cap",
            stats.skipped_bytes,
            stats.overflow_bytes
        );
    }
    if pipeline.buffered_len() > 0 {
        log::debug!("{} trailing byte(s) did not form a frame", pipeline.buffered_len());
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
