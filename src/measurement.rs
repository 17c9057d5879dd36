//! Decode measurement block payloads into measurement events.
//!
//! A payload is base64 text wrapping a gzip stream wrapping one JSON document:
//!
//! ```text
//! { "hash": 123456789,
//!   "meas": [ { "timestamp": {"secs": 1633072800, "nanos": 123456789},
//!               "meas_id": "1",
//!               "origin": "Upc" } ] }
//! ```
//!
//! The block's `hash` is copied onto every event it contains. The order of the
//! `meas` entries is kept as-is; callers sort by timestamp later.

use std::fmt;
use std::io::Read;

use base64::Engine;
use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::trace::constants::NANOS_PER_SEC;
use crate::trace::{MeasurementEvent, Origin};

/// Reasons a measurement block yields no events.
#[derive(Debug)]
pub enum DecodeError {
    /// The payload is not valid base64.
    Base64(base64::DecodeError),
    /// The decoded bytes are not a gzip stream of UTF-8 text.
    Decompress(std::io::Error),
    /// The decompressed text does not match the block schema.
    Json(serde_json::Error),
    /// `secs`/`nanos` do not fit in a signed 64-bit nanosecond count.
    TimestampOverflow { secs: u64, nanos: u32 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Base64(e) => write!(f, "invalid base64 payload: {e}"),
            DecodeError::Decompress(e) => write!(f, "failed to decompress payload: {e}"),
            DecodeError::Json(e) => write!(f, "invalid measurement JSON: {e}"),
            DecodeError::TimestampOverflow { secs, nanos } => {
                write!(f, "timestamp {secs}s {nanos}ns is out of range")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Base64(e) => Some(e),
            DecodeError::Decompress(e) => Some(e),
            DecodeError::Json(e) => Some(e),
            DecodeError::TimestampOverflow { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawBlock {
    hash: u64,
    meas: Vec<RawMeasurement>,
}

#[derive(Deserialize)]
struct RawMeasurement {
    timestamp: RawTimestamp,
    #[serde(default)]
    meas_id: Option<RawMeasId>,
    origin: Origin,
}

#[derive(Deserialize)]
struct RawTimestamp {
    secs: u64,
    nanos: u32,
}

impl RawTimestamp {
    fn to_nanos(&self) -> Result<i64, DecodeError> {
        i64::try_from(self.secs)
            .ok()
            .and_then(|secs| secs.checked_mul(NANOS_PER_SEC))
            .and_then(|ns| ns.checked_add(i64::from(self.nanos)))
            .ok_or(DecodeError::TimestampOverflow {
                secs: self.secs,
                nanos: self.nanos,
            })
    }
}

/// Some producers emit numeric ids; they are kept as their decimal text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMeasId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl RawMeasId {
    fn into_string(self) -> String {
        match self {
            RawMeasId::Text(s) => s,
            RawMeasId::Unsigned(n) => n.to_string(),
            RawMeasId::Signed(n) => n.to_string(),
        }
    }
}

/// Decode one measurement block payload.
///
/// Either every entry of the block decodes or the whole block is rejected, so
/// a caller never sees half a block.
pub fn decode_block(payload: &str) -> Result<Vec<MeasurementEvent>, DecodeError> {
    let compressed = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(DecodeError::Base64)?;

    let mut json = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut json)
        .map_err(DecodeError::Decompress)?;

    let block: RawBlock = serde_json::from_str(&json).map_err(DecodeError::Json)?;
    let hash = block.hash;

    block
        .meas
        .into_iter()
        .map(|raw| {
            Ok(MeasurementEvent {
                ts: raw.timestamp.to_nanos()?,
                hash,
                origin: raw.origin,
                meas_id: raw.meas_id.map(RawMeasId::into_string),
            })
        })
        .collect()
}
