//! Parquet export of path tables and decoded event streams.

pub mod paths;
pub mod writer;

pub use paths::{sanitize_key, OutputPaths};
pub use writer::{write_batch, write_events, write_path_tables, ManifestEntry};
