//! Arrow schema definitions for decoded streams and path tables.
//!
//! Timestamp columns are nanosecond instants tagged with the UTC time zone.
//! Path tables have a dynamic shape, so only their building blocks live here;
//! `PathTable::schema` assembles the full schema per table.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

use super::constants::TIMESTAMP_TZ;

/// Data type of every timestamp column.
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Nanosecond, Some(TIMESTAMP_TZ.into()))
}

/// Schema for command.parquet
pub fn command_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("timestamp", timestamp_type(), false),
        Field::new("command", DataType::Utf8, false),
    ]))
}

/// Schema for measurement.parquet
pub fn measurement_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("timestamp", timestamp_type(), false),
        Field::new("meas_id", DataType::Utf8, true),
        Field::new("origin", DataType::Utf8, false),
        Field::new("hash", DataType::UInt64, false),
    ]))
}

/// Correlation id column of a path table.
pub fn hash_field() -> Field {
    Field::new("hash", DataType::UInt64, false)
}

/// Timestamp column for one hop of a path table.
pub fn hop_field(name: &str) -> Field {
    Field::new(name, timestamp_type(), false)
}

/// Microsecond delay column of a path table.
pub fn delay_field(name: &str) -> Field {
    Field::new(name, DataType::Int64, false)
}
