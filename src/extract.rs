//! End-to-end delay extraction: parse, segment, match, merge.

use std::path::Path;

use anyhow::Result;

use crate::log_reader::{parse_log_file, ParsedLog};
use crate::path::{PathMatcher, PathTables};
use crate::segment::{extract_segments, OpenPolicy};

/// Extraction options.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Publish one delay column per adjacent hop pair.
    pub all_paths: bool,
    /// Handling of a Start seen while a session is open.
    pub open_policy: OpenPolicy,
}

/// Build the path tables of an already parsed log.
pub fn extract_delay(parsed: &ParsedLog, config: &Config) -> PathTables {
    let segments = extract_segments(&parsed.commands, &parsed.measurements, config.open_policy);
    let tables = PathMatcher::new(config.all_paths).match_segments(&segments);

    tracing::info!(
        "Extracted {} rows in {} paths from {} segments",
        tables.row_count(),
        tables.len(),
        segments.len()
    );
    tables
}

/// Parse the log at `path` and build its path tables.
pub fn extract_delay_from_log(path: &Path, config: &Config) -> Result<PathTables> {
    let parsed = parse_log_file(path)?;
    Ok(extract_delay(&parsed, config))
}
