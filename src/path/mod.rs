//! Path delay reconstruction.
//!
//! For each segment, events are grouped by correlation hash and every group is
//! processed on its own:
//!
//! 1. Sort the group by timestamp and rank each event by arrival order within
//!    its origin (`Upc_1`, `Upc_2`, `Ims_1`, ...).
//! 2. Drop groups seen by fewer than two origins; there is nothing to measure.
//! 3. For each anchor (an event carrying a `meas_id`), take its ordinal `k`
//!    among the anchors of its own origin and pair it with the rank-`k`
//!    occurrence of every other origin in the group. An anchor missing any of
//!    those partners contributes nothing.
//! 4. Order the row's hops chronologically. That order is the row's
//!    [`PathSignature`] and decides which [`PathTable`] it lands in.
//!
//! Matching keeps no state between calls, so segments (and groups within a
//! segment) can be matched independently and the results merged.

mod rank;
mod signature;
mod table;

pub use rank::{rank_group, RankCounter, RankedEvent};
pub use signature::{Hop, PathSignature, PATH_KEY_SEPARATOR};
pub use table::{PathRow, PathTable, PathTables, DELAY_GLOBAL_COLUMN};

use std::collections::{HashMap, HashSet};

use crate::segment::Segment;
use crate::trace::{MeasurementEvent, Origin};

/// Correlates the events of a segment into per-path delay tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathMatcher {
    all_paths: bool,
}

impl PathMatcher {
    /// With `all_paths` set, tables also publish one delay column per adjacent
    /// hop pair.
    pub fn new(all_paths: bool) -> Self {
        Self { all_paths }
    }

    /// Match one segment.
    pub fn match_segment(&self, segment: &Segment<'_>) -> PathTables {
        let mut tables = PathTables::new();

        for (hash, mut group) in group_by_hash(segment.events) {
            group.sort_by_key(|e| e.ts);
            let ranked = rank_group(&group);
            for (signature, row) in match_group(hash, &ranked) {
                tables.insert_row(signature, self.all_paths, row);
            }
        }

        tracing::debug!(
            "Segment [{}, {}]: {} events -> {} rows in {} paths",
            segment.start,
            segment.stop,
            segment.events.len(),
            tables.row_count(),
            tables.len()
        );
        tables
    }

    /// Match every segment and merge the tables in segment order.
    pub fn match_segments(&self, segments: &[Segment<'_>]) -> PathTables {
        segments
            .iter()
            .map(|segment| self.match_segment(segment))
            .fold(PathTables::new(), |mut merged, tables| {
                merged.merge(tables);
                merged
            })
    }
}

/// Group events by hash, keeping groups in order of first appearance.
fn group_by_hash(events: &[MeasurementEvent]) -> Vec<(u64, Vec<&MeasurementEvent>)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<(u64, Vec<&MeasurementEvent>)> = Vec::new();

    for event in events {
        let slot = *index.entry(event.hash).or_insert_with(|| {
            groups.push((event.hash, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(event);
    }
    groups
}

/// Build the rows of one ranked, time-sorted group.
fn match_group(hash: u64, ranked: &[RankedEvent<'_>]) -> Vec<(PathSignature, PathRow)> {
    let mut origins: Vec<&Origin> = Vec::new();
    let mut occurrences: HashMap<(&Origin, u32), &RankedEvent<'_>> = HashMap::new();
    for r in ranked {
        if !origins.contains(&&r.event.origin) {
            origins.push(&r.event.origin);
        }
        occurrences.insert((&r.event.origin, r.rank), r);
    }

    if origins.len() < 2 {
        tracing::trace!("Hash {hash}: single origin, no delay to compute");
        return Vec::new();
    }

    let mut anchors = RankCounter::default();
    let mut seen: HashSet<PathSignature> = HashSet::new();
    let mut rows = Vec::new();

    'anchors: for anchor in ranked.iter().filter(|r| r.event.is_anchor()) {
        let k = anchors.next(&anchor.event.origin);

        let mut hops: Vec<&RankedEvent<'_>> = Vec::with_capacity(origins.len());
        hops.push(anchor);
        for &origin in origins.iter().filter(|&&o| o != &anchor.event.origin) {
            match occurrences.get(&(origin, k)) {
                Some(&partner) => hops.push(partner),
                None => {
                    tracing::trace!(
                        "Hash {hash}: anchor {} has no {origin}_{k} partner",
                        anchor.hop()
                    );
                    continue 'anchors;
                }
            }
        }

        hops.sort_by(|a, b| a.ts().cmp(&b.ts()).then_with(|| a.hop().cmp(&b.hop())));
        let signature = PathSignature::new(hops.iter().map(|h| h.hop()).collect());
        if !seen.insert(signature.clone()) {
            continue;
        }

        let row = PathRow::from_timestamps(hash, hops.iter().map(|h| h.ts()).collect());
        rows.push((signature, row));
    }
    rows
}
