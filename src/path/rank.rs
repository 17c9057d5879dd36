//! Arrival-order ranking inside one correlation group.

use std::collections::HashMap;

use super::signature::Hop;
use crate::trace::{MeasurementEvent, Origin};

/// Next rank to hand out per origin.
///
/// A counter only ever lives for one correlation group. It is threaded through
/// the ranking fold by value, so no rank state survives a group.
#[derive(Debug, Default)]
pub struct RankCounter<'a> {
    next: HashMap<&'a Origin, u32>,
}

impl<'a> RankCounter<'a> {
    /// Claim the next rank for `origin`, starting at 1.
    pub fn next(&mut self, origin: &'a Origin) -> u32 {
        let slot = self.next.entry(origin).or_insert(0);
        *slot += 1;
        *slot
    }

    /// Number of distinct origins seen so far.
    pub fn origin_count(&self) -> usize {
        self.next.len()
    }
}

/// A measurement event together with its rank within its group.
#[derive(Clone, Copy, Debug)]
pub struct RankedEvent<'a> {
    pub event: &'a MeasurementEvent,
    pub rank: u32,
}

impl RankedEvent<'_> {
    pub fn hop(&self) -> Hop {
        Hop::new(self.event.origin.clone(), self.rank)
    }

    pub fn ts(&self) -> i64 {
        self.event.ts
    }
}

/// Rank every event of a time-sorted group: an event's rank is one more than
/// the number of earlier events in the group with the same origin.
pub fn rank_group<'a>(group: &[&'a MeasurementEvent]) -> Vec<RankedEvent<'a>> {
    let (ranked, _) = group.iter().fold(
        (Vec::with_capacity(group.len()), RankCounter::default()),
        |(mut ranked, mut counter), &event| {
            let rank = counter.next(&event.origin);
            ranked.push(RankedEvent { event, rank });
            (ranked, counter)
        },
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ts: i64, origin: &str) -> MeasurementEvent {
        MeasurementEvent {
            ts,
            hash: 1,
            origin: Origin::from(origin),
            meas_id: None,
        }
    }

    #[test]
    fn test_rank_by_arrival() {
        let events = vec![
            event(1, "Upc"),
            event(2, "Upc"),
            event(3, "Ims"),
            event(4, "Ims"),
            event(5, "Upc"),
        ];
        let group: Vec<&MeasurementEvent> = events.iter().collect();

        let hops: Vec<String> = rank_group(&group).iter().map(|r| r.hop().to_string()).collect();
        assert_eq!(hops, vec!["Upc_1", "Upc_2", "Ims_1", "Ims_2", "Upc_3"]);
    }

    #[test]
    fn test_ranking_is_per_call() {
        let events = vec![event(1, "Upc"), event(2, "Ims")];
        let group: Vec<&MeasurementEvent> = events.iter().collect();

        let first = rank_group(&group);
        let second = rank_group(&group);
        assert!(first.iter().zip(&second).all(|(a, b)| a.rank == b.rank));
        assert!(second.iter().all(|r| r.rank == 1));
    }

    #[test]
    fn test_counter_counts_origins() {
        let upc = Origin::Upc;
        let ims = Origin::Ims;
        let mut counter = RankCounter::default();
        assert_eq!(counter.next(&upc), 1);
        assert_eq!(counter.next(&upc), 2);
        assert_eq!(counter.next(&ims), 1);
        assert_eq!(counter.origin_count(), 2);
    }
}
