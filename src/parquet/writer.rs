//! Parquet writers for path tables and decoded event streams.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;

use super::paths::OutputPaths;
use crate::log_reader::ParsedLog;
use crate::path::PathTables;

/// One entry of the `paths.json` manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub key: String,
    pub file: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

fn writer_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_max_row_group_size(1_000_000)
        .build()
}

/// Create `dir` if needed; fail if it exists and is not a directory.
fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    } else if !dir.is_dir() {
        anyhow::bail!(
            "Output path exists but is not a directory: {}",
            dir.display()
        );
    }
    Ok(())
}

/// Write a single batch to a new Parquet file at `path`.
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_props()))
        .with_context(|| format!("Failed to create Parquet writer for: {}", path.display()))?;
    writer
        .write(batch)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}

/// Write one Parquet file per path table plus the `paths.json` manifest.
///
/// Returns the manifest entries in the order they were written.
pub fn write_path_tables(dir: &Path, tables: &PathTables) -> Result<Vec<ManifestEntry>> {
    ensure_output_dir(dir)?;
    let paths = OutputPaths::new(dir);

    let mut manifest = Vec::with_capacity(tables.len());
    for (index, table) in tables.iter().enumerate() {
        let key = table.key();
        let file = OutputPaths::path_table_file_name(index, &key);
        let batch = table
            .to_record_batch()
            .with_context(|| format!("Failed to build batch for path {key}"))?;
        write_batch(&paths.dir().join(&file), &batch)?;

        tracing::debug!("Wrote {} rows for {} to {}", table.len(), key, file);
        manifest.push(ManifestEntry {
            key,
            file,
            columns: table.columns(),
            rows: table.len(),
        });
    }

    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&paths.manifest, json)
        .with_context(|| format!("Failed to write {}", paths.manifest.display()))?;

    tracing::info!(
        "Wrote {} path tables to {}",
        manifest.len(),
        dir.display()
    );
    Ok(manifest)
}

/// Write the decoded command and measurement streams.
pub fn write_events(dir: &Path, parsed: &ParsedLog) -> Result<()> {
    ensure_output_dir(dir)?;
    let paths = OutputPaths::new(dir);

    write_batch(&paths.command, &parsed.command_batch()?)?;
    write_batch(&paths.measurement, &parsed.measurement_batch()?)?;

    tracing::info!(
        "Wrote {} commands and {} measurements to {}",
        parsed.commands.len(),
        parsed.measurements.len(),
        dir.display()
    );
    Ok(())
}
