//! Scan a delay measurement log into ordered command and measurement streams.
//!
//! Every line goes through [`decode_line`]; measurement blocks are then
//! expanded with [`decode_block`]. Nothing in a single line can abort the scan:
//! unrecognized lines and undecodable blocks are counted in [`ParseStats`] and
//! skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{StringBuilder, TimestampNanosecondArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use flate2::read::GzDecoder;
use serde::Serialize;

use crate::line::{decode_line, LogRecord};
use crate::measurement::decode_block;
use crate::trace::constants::TIMESTAMP_TZ;
use crate::trace::{command_schema, measurement_schema, CommandEvent, MeasurementEvent};

/// Counters describing how a log was consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Physical lines read, blank ones included.
    pub lines: u64,
    /// Start/Stop markers recognized.
    pub commands: u64,
    /// Measurement block lines recognized.
    pub blocks: u64,
    /// Measurement events produced by all blocks.
    pub measurements: u64,
    /// Blocks that failed to decode and contributed nothing.
    pub decode_failures: u64,
    /// Lines matching neither grammar.
    pub unrecognized: u64,
}

/// Decoded contents of one log.
///
/// Both streams are sorted by timestamp. The sort is stable, so events with
/// equal timestamps keep their log order.
#[derive(Clone, Debug, Default)]
pub struct ParsedLog {
    pub commands: Vec<CommandEvent>,
    pub measurements: Vec<MeasurementEvent>,
    pub stats: ParseStats,
}

impl ParsedLog {
    /// The command stream as an Arrow batch (`timestamp`, `command`).
    pub fn command_batch(&self) -> Result<RecordBatch> {
        let ts = TimestampNanosecondArray::from(
            self.commands.iter().map(|c| c.ts).collect::<Vec<_>>(),
        )
        .with_timezone(TIMESTAMP_TZ);

        let mut command = StringBuilder::new();
        for c in &self.commands {
            command.append_value(c.command.as_str());
        }

        let batch = RecordBatch::try_new(
            command_schema(),
            vec![Arc::new(ts), Arc::new(command.finish())],
        )?;
        Ok(batch)
    }

    /// The measurement stream as an Arrow batch
    /// (`timestamp`, `meas_id`, `origin`, `hash`).
    pub fn measurement_batch(&self) -> Result<RecordBatch> {
        let ts = TimestampNanosecondArray::from(
            self.measurements.iter().map(|m| m.ts).collect::<Vec<_>>(),
        )
        .with_timezone(TIMESTAMP_TZ);

        let mut meas_id = StringBuilder::new();
        let mut origin = StringBuilder::new();
        for m in &self.measurements {
            meas_id.append_option(m.meas_id.as_deref());
            origin.append_value(m.origin.as_str());
        }
        let hash = UInt64Array::from(self.measurements.iter().map(|m| m.hash).collect::<Vec<_>>());

        let batch = RecordBatch::try_new(
            measurement_schema(),
            vec![
                Arc::new(ts),
                Arc::new(meas_id.finish()),
                Arc::new(origin.finish()),
                Arc::new(hash),
            ],
        )?;
        Ok(batch)
    }
}

/// Accumulates records line by line; sorting happens once in `finish`.
#[derive(Default)]
struct LogScanner {
    parsed: ParsedLog,
}

impl LogScanner {
    fn push_line(&mut self, line: &str) {
        let stats = &mut self.parsed.stats;
        stats.lines += 1;

        match decode_line(line) {
            Some(LogRecord::Command(event)) => {
                stats.commands += 1;
                self.parsed.commands.push(event);
            }
            Some(LogRecord::Measurement(block)) => {
                stats.blocks += 1;
                match decode_block(&block.payload) {
                    Ok(events) => {
                        stats.measurements += events.len() as u64;
                        self.parsed.measurements.extend(events);
                    }
                    Err(e) => {
                        stats.decode_failures += 1;
                        tracing::debug!("Dropping measurement block on line {}: {}", stats.lines, e);
                    }
                }
            }
            None => stats.unrecognized += 1,
        }
    }

    fn finish(mut self) -> ParsedLog {
        self.parsed.commands.sort_by_key(|c| c.ts);
        self.parsed.measurements.sort_by_key(|m| m.ts);

        let stats = &self.parsed.stats;
        tracing::info!(
            "Scanned {} lines: {} commands, {} blocks ({} failed), {} measurements",
            stats.lines,
            stats.commands,
            stats.blocks,
            stats.decode_failures,
            stats.measurements
        );
        self.parsed
    }
}

/// Decode already-split log lines.
pub fn parse_log_lines<'a, I>(lines: I) -> ParsedLog
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scanner = LogScanner::default();
    for line in lines {
        scanner.push_line(line);
    }
    scanner.finish()
}

/// Decode a log from any buffered reader.
///
/// Lines are read as bytes and converted lossily, so a stray invalid UTF-8
/// sequence only spoils the line it appears on.
pub fn parse_log_reader<R: BufRead>(mut reader: R) -> Result<ParsedLog> {
    let mut scanner = LogScanner::default();
    let mut buf = Vec::with_capacity(4096);

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        scanner.push_line(line.trim_end_matches(['\n', '\r']));
    }

    Ok(scanner.finish())
}

/// Decode a log file. Files ending in `.gz` are decompressed on the fly.
pub fn parse_log_file(path: &Path) -> Result<ParsedLog> {
    if !path.exists() {
        bail!("Log file not found: {}", path.display());
    }
    let reader = open_log_reader(path)?;
    parse_log_reader(reader).with_context(|| format!("Failed to read {}", path.display()))
}

fn open_log_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::with_capacity(256 * 1024, file);

    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    if name.ends_with(".gz") {
        let decoder = GzDecoder::new(reader);
        Ok(Box::new(BufReader::with_capacity(256 * 1024, decoder)))
    } else {
        Ok(Box::new(reader))
    }
}
