//! Delay measurement log analysis.
//!
//! Turns a service log carrying Start/Stop session markers and compressed
//! measurement blocks into one delay table per observed transaction path.
//!
//! # Modules
//!
//! - [`log_reader`] - Scan a log (plain or gzip) into ordered command and measurement streams
//! - [`segment`] - Split the measurement stream into Start/Stop sessions
//! - [`path`] - Rank, pair and tabulate the events of each session
//! - [`extract`] - The whole pipeline behind one call
//! - [`stats`] - Delay percentiles per path
//! - [`parquet`] / [`output`] - Parquet export and terminal rendering
//!
//! # Example
//!
//! ```no_run
//! use delay_meas::{extract_delay_from_log, Config};
//! use std::path::Path;
//!
//! let tables = extract_delay_from_log(Path::new("service.log"), &Config::default())
//!     .expect("Failed to extract delays");
//! for table in &tables {
//!     println!("{}: {} rows", table.key(), table.len());
//! }
//! ```

pub mod extract;
pub mod line;
pub mod log_reader;
pub mod measurement;
pub mod output;
pub mod parquet;
pub mod path;
pub mod segment;
pub mod stats;
pub mod trace;

pub use extract::{extract_delay, extract_delay_from_log, Config};
pub use log_reader::{parse_log_file, parse_log_lines, parse_log_reader, ParseStats, ParsedLog};
pub use measurement::{decode_block, DecodeError};
pub use path::{PathMatcher, PathRow, PathSignature, PathTable, PathTables};
pub use segment::{extract_segments, OpenPolicy, Segment};
pub use stats::{delay_stats, DelayStatsResult, PathDelayStats};
