//! Shared constants for log decoding and delay computation.

use std::sync::LazyLock;

use regex::Regex;

/// Message body of the marker that opens a measurement session.
pub const START_MESSAGE: &str = "Start msg from FSW received";

/// Message body of the marker that closes a measurement session.
pub const STOP_MESSAGE: &str = "Stop msg from FSW received";

/// Nanoseconds per microsecond, used when reducing timestamps to delays.
pub const NANOS_PER_MICRO: i64 = 1_000;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Time zone attached to every timestamp column we export.
pub const TIMESTAMP_TZ: &str = "UTC";

/// Static regex for splitting a log line. Compiled once at first use.
/// Pattern: `<timestamp>  <LEVEL> <module>: <message>`
/// The module is matched non-greedily so `a::b::c:` stops at the colon that is
/// followed by whitespace.
pub static LOG_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+([A-Z]+)\s+(\S+?):\s+(.*?)\s*$").expect("Invalid log line regex pattern")
});

/// Static regex for a measurement block message.
/// Pattern: `mime=application/json, data=<base64>`
pub static MEAS_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^mime=application/json,\s*data=([A-Za-z0-9+/=]+)$")
        .expect("Invalid measurement block regex pattern")
});
