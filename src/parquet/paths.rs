//! Output file path management.

use std::path::{Path, PathBuf};

/// Longest sanitized path key kept in a file name.
const MAX_KEY_IN_FILE_NAME: usize = 120;

/// Paths to the files written into an output directory.
pub struct OutputPaths {
    dir: PathBuf,
    pub manifest: PathBuf,
    pub command: PathBuf,
    pub measurement: PathBuf,
}

impl OutputPaths {
    /// Create paths for output files in the given directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            manifest: dir.join("paths.json"),
            command: dir.join("command.parquet"),
            measurement: dir.join("measurement.parquet"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of the `index`-th path table, e.g. `path_000_Ims_1-Upc_1.parquet`.
    ///
    /// The index keeps names unique even when two keys sanitize alike.
    pub fn path_table_file_name(index: usize, key: &str) -> String {
        format!("path_{index:03}_{}.parquet", sanitize_key(key))
    }

    /// Full path of the `index`-th path table.
    pub fn path_table(&self, index: usize, key: &str) -> PathBuf {
        self.dir.join(Self::path_table_file_name(index, key))
    }
}

/// Make a path key safe for use in a file name.
///
/// `->` becomes `-`, anything outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn sanitize_key(key: &str) -> String {
    key.replace("->", "-")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_IN_FILE_NAME)
        .collect()
}
