//! Text rendering of Arrow batches and statistics for the terminal.
//!
//! Everything is first flattened into a [`TextTable`] of strings, then written
//! as an aligned table, CSV or JSON. Renderers take any [`Write`] so tests can
//! capture the output.

use std::io::Write;

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use clap::ValueEnum;

use crate::stats::DelayStatsResult;

/// Widest column printed in table mode; longer values are cut with `...`.
pub const MAX_COLUMN_WIDTH: usize = 50;

/// Output format for terminal rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Column headers and stringified rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Stringify every cell of a record batch. Nulls render as `NULL`.
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let options = FormatOptions::default().with_null("NULL");
        let headers = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();

        let formatters = batch
            .columns()
            .iter()
            .map(|c| ArrayFormatter::try_new(c.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = (0..batch.num_rows())
            .map(|row| {
                formatters
                    .iter()
                    .map(|f| f.value(row).to_string())
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Rows as JSON objects keyed by header; every value is a string.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// One table per path for the delay statistics.
pub fn stats_table(stats: &DelayStatsResult) -> TextTable {
    fn opt<T: ToString>(v: Option<T>) -> String {
        v.map_or_else(|| "NULL".to_string(), |v| v.to_string())
    }

    let headers = ["path", "hops", "rows", "min_us", "max_us", "mean_us", "p50_us", "p90_us", "p99_us"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = stats
        .paths
        .iter()
        .map(|p| {
            vec![
                p.path.clone(),
                p.hops.to_string(),
                p.rows.to_string(),
                opt(p.min_us),
                opt(p.max_us),
                opt(p.mean_us.map(|m| format!("{m:.1}"))),
                opt(p.p50_us),
                opt(p.p90_us),
                opt(p.p99_us),
            ]
        })
        .collect();
    TextTable { headers, rows }
}

/// Render named tables in `format`.
///
/// Table and CSV output print each section after a title line; JSON output is
/// a single object mapping each name to its rows.
pub fn write_sections<W: Write>(
    out: &mut W,
    format: OutputFormat,
    sections: &[(String, TextTable)],
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for (i, (name, table)) in sections.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "== {name} ({} rows) ==", table.rows.len())?;
                write_table(out, table)?;
            }
        }
        OutputFormat::Csv => {
            for (i, (name, table)) in sections.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "# {name}")?;
                write_csv(out, table)?;
            }
        }
        OutputFormat::Json => {
            let obj: serde_json::Map<String, serde_json::Value> = sections
                .iter()
                .map(|(name, table)| (name.clone(), table.to_json()))
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&obj)?)?;
        }
    }
    Ok(())
}

/// Write `table` as CSV. Fields holding a comma, quote or newline are quoted.
pub fn write_csv<W: Write>(out: &mut W, table: &TextTable) -> Result<()> {
    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .map(|c| csv_field(c))
            .collect::<Vec<_>>()
            .join(",")
    };
    writeln!(out, "{}", line(&table.headers))?;
    for row in &table.rows {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `table` as aligned columns separated by `|`.
pub fn write_table<W: Write>(out: &mut W, table: &TextTable) -> Result<()> {
    if table.rows.is_empty() {
        writeln!(out, "(no results)")?;
        return Ok(());
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, val) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(val.chars().count());
            }
        }
    }

    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let width = widths.get(i).copied().unwrap_or(10);
                let cell = truncate(v, width);
                format!("{cell:width$}")
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };

    writeln!(out, "{}", render(&table.headers))?;
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", sep.join("-+-"))?;
    for row in &table.rows {
        writeln!(out, "{}", render(row))?;
    }
    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width && width > 3 {
        let kept: String = value.chars().take(width - 3).collect();
        format!("{kept}...")
    } else {
        value.to_string()
    }
}
