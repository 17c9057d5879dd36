//! Record types shared by the decoding, segmentation and matching stages.
//!
//! All timestamps are nanoseconds since the Unix epoch (UTC), stored as `i64`
//! in the same way trace timestamps are stored in our Arrow tables.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Control marker bounding a measurement session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "Start",
            Command::Stop => "Stop",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Start or Stop marker and the instant it was logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub ts: i64,
    pub command: Command,
}

impl CommandEvent {
    pub fn start(ts: i64) -> Self {
        Self {
            ts,
            command: Command::Start,
        }
    }

    pub fn stop(ts: i64) -> Self {
        Self {
            ts,
            command: Command::Stop,
        }
    }
}

/// Observation point that recorded a measurement.
///
/// The probes we know about get their own variant and anything else is kept
/// verbatim in `Other`. Equality, ordering and hashing all go through
/// [`Origin::as_str`], so a label behaves the same whichever variant holds it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Origin {
    /// Access-layer probe.
    Upc,
    /// Core-network probe.
    Ims,
    Other(String),
}

impl Origin {
    pub fn as_str(&self) -> &str {
        match self {
            Origin::Upc => "Upc",
            Origin::Ims => "Ims",
            Origin::Other(label) => label.as_str(),
        }
    }
}

impl From<&str> for Origin {
    fn from(label: &str) -> Self {
        match label {
            "Upc" => Origin::Upc,
            "Ims" => Origin::Ims,
            other => Origin::Other(other.to_string()),
        }
    }
}

impl From<String> for Origin {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Upc" => Origin::Upc,
            "Ims" => Origin::Ims,
            _ => Origin::Other(label),
        }
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl PartialEq for Origin {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Origin {}

impl Hash for Origin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Origin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Origin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded measurement.
///
/// # Fields
/// - `ts`: Instant the measurement was taken, in nanoseconds
/// - `hash`: Correlation id shared by every event of one transaction
/// - `origin`: Observation point that recorded the event
/// - `meas_id`: Explicit measurement id; events carrying one are anchors
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasurementEvent {
    pub ts: i64,
    pub hash: u64,
    pub origin: Origin,
    pub meas_id: Option<String>,
}

impl MeasurementEvent {
    /// Whether this event starts an output row.
    pub fn is_anchor(&self) -> bool {
        self.meas_id.is_some()
    }
}
