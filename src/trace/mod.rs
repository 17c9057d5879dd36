//! Shared delay measurement data types and schemas.
//!
//! These types flow through every stage of the pipeline: the line decoder
//! produces them, the segment extractor slices them and the path matcher
//! correlates them. Keeping them in one place keeps the Arrow export and the
//! in-memory model in agreement.
//!
//! # Module Organization
//!
//! - [`models`]: Command and measurement records, origin labels
//! - [`schema`]: Arrow schema definitions for decoded streams and path tables
//! - [`constants`]: Shared constants (line grammar regexes, unit conversions)

pub mod constants;
pub mod models;
pub mod schema;

// Re-export commonly used types
pub use models::*;
pub use schema::*;
