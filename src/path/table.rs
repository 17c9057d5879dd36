//! Per-path output tables.
//!
//! Every row of a table has the same hop shape, so the table only needs the
//! signature once and each row is a flat list of timestamps.

use std::collections::btree_map::{self, BTreeMap};
use std::sync::Arc;

use anyhow::Result;
use arrow::array::{ArrayRef, Int64Array, TimestampNanosecondArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use super::signature::PathSignature;
use crate::trace::constants::{NANOS_PER_MICRO, TIMESTAMP_TZ};
use crate::trace::{delay_field, hash_field, hop_field};

/// Name of the end-to-end delay column.
pub const DELAY_GLOBAL_COLUMN: &str = "delay_global_us";

/// One matched transaction instance.
///
/// # Fields
/// - `hash`: Correlation id of the group the row came from
/// - `hop_ts`: Hop timestamps in nanoseconds, in signature order
/// - `delay_global_us`: Last hop minus first hop, in microseconds
/// - `hop_delays_us`: Delay between each adjacent hop pair, in microseconds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRow {
    pub hash: u64,
    pub hop_ts: Vec<i64>,
    pub delay_global_us: i64,
    pub hop_delays_us: Vec<i64>,
}

impl PathRow {
    /// Build a row from chronologically ordered hop timestamps.
    pub fn from_timestamps(hash: u64, hop_ts: Vec<i64>) -> Self {
        let delay_global_us = match (hop_ts.first(), hop_ts.last()) {
            (Some(first), Some(last)) => (last - first) / NANOS_PER_MICRO,
            _ => 0,
        };
        let hop_delays_us = hop_ts
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) / NANOS_PER_MICRO)
            .collect();

        Self {
            hash,
            hop_ts,
            delay_global_us,
            hop_delays_us,
        }
    }
}

/// Append-only rows sharing one path signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTable {
    signature: PathSignature,
    all_paths: bool,
    rows: Vec<PathRow>,
}

impl PathTable {
    /// `all_paths` controls whether the adjacent-pair delay columns are
    /// published; rows always carry them.
    pub fn new(signature: PathSignature, all_paths: bool) -> Self {
        Self {
            signature,
            all_paths,
            rows: Vec::new(),
        }
    }

    pub fn signature(&self) -> &PathSignature {
        &self.signature
    }

    pub fn key(&self) -> String {
        self.signature.key()
    }

    pub fn all_paths(&self) -> bool {
        self.all_paths
    }

    pub fn rows(&self) -> &[PathRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: PathRow) {
        debug_assert_eq!(row.hop_ts.len(), self.signature.len());
        self.rows.push(row);
    }

    /// Append every row of `other`, which must share this table's signature.
    pub fn append(&mut self, other: PathTable) {
        debug_assert_eq!(self.signature, other.signature);
        self.all_paths |= other.all_paths;
        self.rows.extend(other.rows);
    }

    /// Column names, in order: `hash`, one per hop, `delay_global_us`, then the
    /// adjacent-pair delays when `all_paths` is set.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(2 + 2 * self.signature.len());
        columns.push("hash".to_string());
        columns.extend(self.signature.hops().iter().map(|h| h.column_name()));
        columns.push(DELAY_GLOBAL_COLUMN.to_string());
        if self.all_paths {
            columns.extend(self.signature.hop_delay_columns());
        }
        columns
    }

    /// Arrow schema for this table.
    pub fn schema(&self) -> Arc<Schema> {
        let mut fields: Vec<Field> = vec![hash_field()];
        fields.extend(
            self.signature
                .hops()
                .iter()
                .map(|h| hop_field(&h.column_name())),
        );
        fields.push(delay_field(DELAY_GLOBAL_COLUMN));
        if self.all_paths {
            fields.extend(
                self.signature
                    .hop_delay_columns()
                    .iter()
                    .map(|name| delay_field(name)),
            );
        }
        Arc::new(Schema::new(fields))
    }

    /// Convert the table to an Arrow record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let hops = self.signature.len();
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(2 + 2 * hops);

        columns.push(Arc::new(UInt64Array::from(
            self.rows.iter().map(|r| r.hash).collect::<Vec<_>>(),
        )));
        for i in 0..hops {
            let ts = TimestampNanosecondArray::from(
                self.rows.iter().map(|r| r.hop_ts[i]).collect::<Vec<_>>(),
            )
            .with_timezone(TIMESTAMP_TZ);
            columns.push(Arc::new(ts));
        }
        columns.push(Arc::new(Int64Array::from(
            self.rows
                .iter()
                .map(|r| r.delay_global_us)
                .collect::<Vec<_>>(),
        )));
        if self.all_paths {
            for i in 0..hops.saturating_sub(1) {
                columns.push(Arc::new(Int64Array::from(
                    self.rows
                        .iter()
                        .map(|r| r.hop_delays_us[i])
                        .collect::<Vec<_>>(),
                )));
            }
        }

        let batch = RecordBatch::try_new(self.schema(), columns)?;
        Ok(batch)
    }
}

/// Path tables keyed by signature.
///
/// Iteration order is the signature order, so output is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathTables {
    tables: BTreeMap<PathSignature, PathTable>,
}

impl PathTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of rows across every table.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(PathTable::len).sum()
    }

    pub fn get(&self, signature: &PathSignature) -> Option<&PathTable> {
        self.tables.get(signature)
    }

    /// Look a table up by its published key.
    pub fn get_by_key(&self, key: &str) -> Option<&PathTable> {
        self.tables.values().find(|t| t.key() == key)
    }

    /// Published keys of every table.
    pub fn keys(&self) -> Vec<String> {
        self.tables.values().map(PathTable::key).collect()
    }

    pub fn iter(&self) -> btree_map::Values<'_, PathSignature, PathTable> {
        self.tables.values()
    }

    /// Append a row to the table for `signature`, creating it if needed.
    pub fn insert_row(&mut self, signature: PathSignature, all_paths: bool, row: PathRow) {
        self.tables
            .entry(signature)
            .or_insert_with_key(|sig| PathTable::new(sig.clone(), all_paths))
            .push(row);
    }

    /// Append every table of `other` to the matching table here.
    pub fn merge(&mut self, other: PathTables) {
        for (signature, table) in other.tables {
            match self.tables.entry(signature) {
                btree_map::Entry::Occupied(mut entry) => entry.get_mut().append(table),
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(table);
                }
            }
        }
    }
}

impl IntoIterator for PathTables {
    type Item = PathTable;
    type IntoIter = btree_map::IntoValues<PathSignature, PathTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_values()
    }
}

impl<'a> IntoIterator for &'a PathTables {
    type Item = &'a PathTable;
    type IntoIter = btree_map::Values<'a, PathSignature, PathTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.values()
    }
}
