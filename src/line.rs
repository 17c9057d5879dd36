//! Parse individual log lines into typed records.
//!
//! Supports the following message bodies:
//! - `Start msg from FSW received`: opens a measurement session
//! - `Stop msg from FSW received`: closes a measurement session
//! - `mime=application/json, data=<base64>`: an encoded measurement block
//!
//! Anything else is not an error, the caller simply gets `None`.

use chrono::{DateTime, NaiveDateTime};

use crate::trace::constants::{LOG_LINE_RE, MEAS_BLOCK_RE, START_MESSAGE, STOP_MESSAGE};
use crate::trace::CommandEvent;

/// A still-encoded measurement block taken from one log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasurementBlock {
    /// Timestamp of the log line itself, if it parsed. The measurements inside
    /// carry their own timestamps, so this is informational only.
    pub ts: Option<i64>,
    /// Base64 text of the gzip-compressed JSON document.
    pub payload: String,
}

/// Typed view of one recognized log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogRecord {
    Command(CommandEvent),
    Measurement(MeasurementBlock),
}

/// Parse a log line into a command marker or a measurement block.
///
/// # Log Line Format
///
/// ```text
/// 2021-10-01T07:19:58+00:00  INFO centralservice::delay_meas_core: Start msg from FSW received
/// 2021-10-01T07:20:00+00:00  INFO centralservice::delay_meas_core: mime=application/json, data=H4sI...
/// ```
///
/// # Returns
///
/// `None` for lines that match neither grammar, and for command lines whose
/// timestamp cannot be parsed.
pub fn decode_line(line: &str) -> Option<LogRecord> {
    let caps = LOG_LINE_RE.captures(line)?;
    let ts_str = caps.get(1)?.as_str();
    let message = caps.get(4)?.as_str();

    if message == START_MESSAGE {
        return parse_timestamp(ts_str).map(|ts| LogRecord::Command(CommandEvent::start(ts)));
    }
    if message == STOP_MESSAGE {
        return parse_timestamp(ts_str).map(|ts| LogRecord::Command(CommandEvent::stop(ts)));
    }

    let block = MEAS_BLOCK_RE.captures(message)?;
    Some(LogRecord::Measurement(MeasurementBlock {
        ts: parse_timestamp(ts_str),
        payload: block.get(1)?.as_str().to_string(),
    }))
}

/// Parse an ISO-8601 timestamp into nanoseconds since the epoch.
///
/// Timestamps with an offset (`+00:00`, `Z`) are converted to UTC; timestamps
/// without one are taken to already be UTC.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_nanos_opt();
    }
    s.parse::<NaiveDateTime>()
        .ok()
        .and_then(|naive| naive.and_utc().timestamp_nanos_opt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Command;

    const SECS: i64 = 1_633_072_798;

    #[test]
    fn test_decode_start_line() {
        let line = "2021-10-01T07:19:58+00:00  INFO centralservice::delay_meas_core: Start msg from FSW received";
        let record = decode_line(line).unwrap();
        assert_eq!(
            record,
            LogRecord::Command(CommandEvent {
                ts: SECS * 1_000_000_000,
                command: Command::Start,
            })
        );
    }

    #[test]
    fn test_decode_stop_line_with_offset() {
        // 09:19:58 at +02:00 is the same instant as 07:19:58 UTC
        let line = "2021-10-01T09:19:58+02:00 DEBUG centralservice::delay_meas_core: Stop msg from FSW received";
        match decode_line(line) {
            Some(LogRecord::Command(event)) => {
                assert_eq!(event.command, Command::Stop);
                assert_eq!(event.ts, SECS * 1_000_000_000);
            }
            other => panic!("Expected Stop command, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_measurement_line() {
        let line = "2021-10-01T07:20:00+00:00  INFO centralservice::delay_meas_core: mime=application/json, data=H4sIAAAAAAAA/w==";
        match decode_line(line) {
            Some(LogRecord::Measurement(block)) => {
                assert_eq!(block.payload, "H4sIAAAAAAAA/w==");
                assert_eq!(block.ts, Some((SECS + 2) * 1_000_000_000));
            }
            other => panic!("Expected measurement block, got {other:?}"),
        }
    }

    #[test]
    fn test_measurement_line_with_bad_timestamp_still_decodes() {
        let line = "yesterday INFO centralservice::delay_meas_core: mime=application/json, data=QUJD";
        match decode_line(line) {
            Some(LogRecord::Measurement(block)) => {
                assert_eq!(block.ts, None);
                assert_eq!(block.payload, "QUJD");
            }
            other => panic!("Expected measurement block, got {other:?}"),
        }
    }

    #[test]
    fn test_command_line_with_bad_timestamp_is_dropped() {
        let line = "yesterday INFO centralservice::delay_meas_core: Start msg from FSW received";
        assert!(decode_line(line).is_none());
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let ts = parse_timestamp("2021-10-01T07:19:58.500000").unwrap();
        assert_eq!(ts, SECS * 1_000_000_000 + 500_000_000);
        assert_eq!(
            parse_timestamp("2021-10-01T07:19:58Z"),
            Some(SECS * 1_000_000_000)
        );
    }

    #[test]
    fn test_unrecognized_lines() {
        assert!(decode_line("").is_none());
        assert!(decode_line("This is not a valid log line").is_none());
        assert!(decode_line(
            "2021-10-01T07:19:58+00:00  INFO centralservice::delay_meas_core: Heartbeat"
        )
        .is_none());
        assert!(decode_line(
            "2021-10-01T07:19:58+00:00  INFO centralservice::delay_meas_core: mime=text/plain, data=QUJD"
        )
        .is_none());
    }
}
