//! Decode a saved hex dump
//!
//! Reads the output of `votronic --dump` (one hex datagram per line), decodes
//! every line and prints a short summary per record plus totals.
//!
//! Usage:
//!   cargo run --example decode_dump -- <dump.txt>

use std::collections::HashMap;
use std::env;
use std::fs;
use votronic_decoder::{DecodedRecord, Output, Pipeline, PipelineConfig, Result, Sink};

#[derive(Default)]
struct Summary {
    records: usize,
    checksum_failures: usize,
    charge_modes: HashMap<String, usize>,
}

impl Summary {
    fn add(&mut self, record: &DecodedRecord) {
        self.records += 1;
        if !record.checksum_valid {
            self.checksum_failures += 1;
        }
        *self.charge_modes.entry(record.charge_mode.to_string()).or_insert(0) += 1;

        println!(
            "{}  bat {:>6} V  solar {:>6} V  {:>6} A  {:>7} W  {:>3} °C  {:<14} {:?}",
            record.timestamp.format("%H:%M:%S"),
            record.battery_voltage,
            record.solar_voltage,
            record.charge_current,
            record.charge_power,
            record.controller_temperature,
            record.charge_mode.to_string(),
            record.battery_status.labels(),
        );
    }

    fn print(&self) {
        println!("\n=== SUMMARY ===");
        println!("Records decoded: {}", self.records);
        println!("Checksum failures: {}", self.checksum_failures);
        for (mode, count) in &self.charge_modes {
            println!("  {:<16} {}", mode, count);
        }
    }
}

impl Sink for Summary {
    fn emit(&mut self, output: Output<'_>) -> Result<()> {
        if let Output::Record(record) = output {
            self.add(record.record());
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: decode_dump <dump.txt>");
            std::process::exit(1);
        }
    };

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut pipeline = Pipeline::new(PipelineConfig::new(), Summary::default());
    for (line_no, line) in content.lines().enumerate() {
        let bytes = match hex::decode(line.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Line {}: not hex ({})", line_no + 1, e);
                continue;
            }
        };
        if let Err(e) = pipeline.on_bytes(&bytes) {
            eprintln!("Line {}: {}", line_no + 1, e);
        }
    }

    pipeline.sink().print();
}
