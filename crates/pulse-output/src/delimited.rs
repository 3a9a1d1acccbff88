//! Comma-separated serialization of normalized tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use pulse_model::NormalizedTable;
use tracing::info;

use crate::common::{EXPORT_DECIMALS, ensure_parent_dir, export_cell, is_hidden_column};

/// Options for delimited-text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvExportOptions {
    /// Also write `_`-prefixed provenance columns.
    pub include_hidden: bool,
    pub decimals: u32,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            decimals: EXPORT_DECIMALS,
        }
    }
}

/// Indexes of the columns written under `options`, in display order.
pub fn export_columns(table: &NormalizedTable, options: CsvExportOptions) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| options.include_hidden || !is_hidden_column(name))
        .map(|(idx, _)| idx)
        .collect()
}

/// Writes a header row followed by one record per table row.
pub fn write_table_csv<W: Write>(
    writer: W,
    table: &NormalizedTable,
    options: CsvExportOptions,
) -> Result<()> {
    let mut out = WriterBuilder::new().from_writer(writer);
    write_records(&mut out, table, options)?;
    out.flush().context("flush csv output")?;
    Ok(())
}

pub(crate) fn write_records<W: Write>(
    out: &mut csv::Writer<W>,
    table: &NormalizedTable,
    options: CsvExportOptions,
) -> Result<()> {
    let columns = export_columns(table, options);
    let names = table.columns();
    let header: Vec<&str> = columns.iter().map(|&idx| names[idx].as_str()).collect();
    out.write_record(&header).context("write csv header")?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        let record: Vec<String> = columns
            .iter()
            .map(|&idx| {
                row.get(idx)
                    .map(|value| export_cell(value, options.decimals))
                    .unwrap_or_default()
            })
            .collect();
        out.write_record(&record)
            .with_context(|| format!("write csv row {}", row_idx + 1))?;
    }
    Ok(())
}

/// Serializes the table to an in-memory string, as offered for download.
pub fn table_to_csv_string(table: &NormalizedTable, options: CsvExportOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_table_csv(&mut buffer, table, options)?;
    String::from_utf8(buffer).context("csv output is not valid UTF-8")
}

/// Writes the table to `path`, creating parent directories.
pub fn write_table_csv_file(
    path: &Path,
    table: &NormalizedTable,
    options: CsvExportOptions,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_table_csv(BufWriter::new(file), table, options)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = table.height(), "wrote csv");
    Ok(())
}
