//! Split a measurement stream into sessions bounded by Start/Stop markers.
//!
//! Markers are replayed in timestamp order through a two-state machine:
//!
//! ```text
//! Closed --Start(t)--> Open(t)
//! Open(s) --Stop(t)--> Closed, emitting Segment(s, t)
//! Closed --Stop--> Closed          (no matching start, ignored)
//! Open(s) --Start(t)--> see OpenPolicy
//! ```
//!
//! A session still open at the end of the log is discarded.

use crate::trace::{Command, CommandEvent, MeasurementEvent};

/// What a Start does while a session is already open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenPolicy {
    /// Ignore the later Start; the first one stays authoritative.
    #[default]
    KeepFirst,
    /// Move the session start to the later Start.
    Restart,
}

/// One measurement session.
///
/// `events` borrows the slice of the sorted measurement stream whose
/// timestamps fall in `[start, stop]`, both ends inclusive. It may be empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    pub start: i64,
    pub stop: i64,
    pub events: &'a [MeasurementEvent],
}

impl<'a> Segment<'a> {
    pub fn new(start: i64, stop: i64, events: &'a [MeasurementEvent]) -> Self {
        Self {
            start,
            stop,
            events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn duration_ns(&self) -> i64 {
        self.stop - self.start
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegmentState {
    Closed,
    Open(i64),
}

/// Run the marker state machine and return the `(start, stop)` pairs it
/// closes, in log order.
pub fn segment_bounds(commands: &[CommandEvent], policy: OpenPolicy) -> Vec<(i64, i64)> {
    let mut ordered: Vec<&CommandEvent> = commands.iter().collect();
    ordered.sort_by_key(|c| c.ts);

    let mut bounds = Vec::new();
    let mut state = SegmentState::Closed;

    for event in ordered {
        state = match (state, event.command) {
            (SegmentState::Closed, Command::Start) => SegmentState::Open(event.ts),
            (SegmentState::Open(start), Command::Start) => match policy {
                OpenPolicy::KeepFirst => {
                    tracing::debug!("Ignoring Start at {} inside session opened at {}", event.ts, start);
                    SegmentState::Open(start)
                }
                OpenPolicy::Restart => {
                    tracing::debug!("Restarting session opened at {} at {}", start, event.ts);
                    SegmentState::Open(event.ts)
                }
            },
            (SegmentState::Open(start), Command::Stop) => {
                bounds.push((start, event.ts));
                SegmentState::Closed
            }
            (SegmentState::Closed, Command::Stop) => {
                tracing::debug!("Ignoring Stop at {} with no open session", event.ts);
                SegmentState::Closed
            }
        };
    }

    if let SegmentState::Open(start) = state {
        tracing::debug!("Discarding session opened at {} that never stopped", start);
    }

    bounds
}

/// Cut the measurement stream into segments.
///
/// `events` must be sorted by timestamp, as [`crate::log_reader::ParsedLog`]
/// provides them; each segment is then a contiguous sub-slice.
pub fn extract_segments<'a>(
    commands: &[CommandEvent],
    events: &'a [MeasurementEvent],
    policy: OpenPolicy,
) -> Vec<Segment<'a>> {
    debug_assert!(events.windows(2).all(|w| w[0].ts <= w[1].ts));

    segment_bounds(commands, policy)
        .into_iter()
        .map(|(start, stop)| Segment::new(start, stop, events_in_range(events, start, stop)))
        .collect()
}

fn events_in_range(events: &[MeasurementEvent], start: i64, stop: i64) -> &[MeasurementEvent] {
    let lo = events.partition_point(|e| e.ts < start);
    let hi = events.partition_point(|e| e.ts <= stop);
    &events[lo..hi.max(lo)]
}
