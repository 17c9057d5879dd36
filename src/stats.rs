use serde::Serialize;

use crate::path::{PathTable, PathTables};

/// Result of delay statistics over a set of path tables.
#[derive(Debug, Serialize)]
pub struct DelayStatsResult {
    pub summary: DelayStatsSummary,
    pub paths: Vec<PathDelayStats>,
}

/// Totals across every path.
#[derive(Debug, Serialize)]
pub struct DelayStatsSummary {
    pub path_count: usize,
    pub total_rows: usize,
}

/// End-to-end delay statistics for one path, in microseconds.
#[derive(Debug, Serialize)]
pub struct PathDelayStats {
    pub path: String,
    pub hops: usize,
    pub rows: usize,
    pub min_us: Option<i64>,
    pub max_us: Option<i64>,
    pub mean_us: Option<f64>,
    pub p50_us: Option<i64>,
    pub p90_us: Option<i64>,
    pub p99_us: Option<i64>,
}

/// Summarize `delay_global_us` for every path table.
pub fn delay_stats(tables: &PathTables) -> DelayStatsResult {
    let paths: Vec<PathDelayStats> = tables.iter().map(path_stats).collect();
    DelayStatsResult {
        summary: DelayStatsSummary {
            path_count: paths.len(),
            total_rows: tables.row_count(),
        },
        paths,
    }
}

fn path_stats(table: &PathTable) -> PathDelayStats {
    let mut delays: Vec<i64> = table.rows().iter().map(|r| r.delay_global_us).collect();
    delays.sort_unstable();

    let mean_us = if delays.is_empty() {
        None
    } else {
        Some(delays.iter().map(|&d| d as f64).sum::<f64>() / delays.len() as f64)
    };

    PathDelayStats {
        path: table.key(),
        hops: table.signature().len(),
        rows: delays.len(),
        min_us: delays.first().copied(),
        max_us: delays.last().copied(),
        mean_us,
        p50_us: percentile(&delays, 50.0),
        p90_us: percentile(&delays, 90.0),
        p99_us: percentile(&delays, 99.0),
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[i64], pct: f64) -> Option<i64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Hop, PathRow, PathSignature};
    use crate::trace::Origin;

    fn sig(first: Origin, second: Origin) -> PathSignature {
        PathSignature::new(vec![Hop::new(first, 1), Hop::new(second, 1)])
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let values: Vec<i64> = (1..=10).collect();
        assert_eq!(percentile(&values, 50.0), Some(5));
        assert_eq!(percentile(&values, 90.0), Some(9));
        assert_eq!(percentile(&values, 99.0), Some(10));
        assert_eq!(percentile(&[42], 50.0), Some(42));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_delay_stats() {
        let mut tables = PathTables::new();
        let upc_ims = sig(Origin::Upc, Origin::Ims);
        for (hash, delay_s) in [(1, 3), (2, 1), (3, 2)] {
            let row = PathRow::from_timestamps(hash, vec![0, delay_s * 1_000_000_000]);
            tables.insert_row(upc_ims.clone(), false, row);
        }
        tables.insert_row(
            sig(Origin::Ims, Origin::Upc),
            false,
            PathRow::from_timestamps(4, vec![0, 500_000]),
        );

        let result = delay_stats(&tables);
        assert_eq!(result.summary.path_count, 2);
        assert_eq!(result.summary.total_rows, 4);

        let stats = result.paths.iter().find(|p| p.path == "Upc_1->Ims_1").unwrap();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.hops, 2);
        assert_eq!(stats.min_us, Some(1_000_000));
        assert_eq!(stats.max_us, Some(3_000_000));
        assert_eq!(stats.mean_us, Some(2_000_000.0));
        assert_eq!(stats.p50_us, Some(2_000_000));
        assert_eq!(stats.p99_us, Some(3_000_000));

        let stats = result.paths.iter().find(|p| p.path == "Ims_1->Upc_1").unwrap();
        assert_eq!(stats.p90_us, Some(500));
    }

    #[test]
    fn test_stats_serialize() {
        let result = delay_stats(&PathTables::new());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["path_count"], 0);
        assert!(json["paths"].as_array().unwrap().is_empty());
    }
}
