//! Multi-section summary exports: headline figures followed by the tables
//! they summarize, in one delimited file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use pulse_model::{CellValue, NormalizedTable, TableBuilder};
use pulse_transform::Headline;
use tracing::info;

use crate::common::ensure_parent_dir;
use crate::delimited::{CsvExportOptions, write_records};

/// One titled block of a summary export.
#[derive(Debug, Clone)]
pub struct SummarySection {
    pub title: String,
    pub table: NormalizedTable,
}

impl SummarySection {
    pub fn new(title: impl Into<String>, table: NormalizedTable) -> Self {
        Self {
            title: title.into(),
            table,
        }
    }
}

/// Two-column `Metric, Value` table of headline display strings.
pub fn headline_table(headlines: &[Headline]) -> NormalizedTable {
    let mut table = TableBuilder::new(["Metric", "Value"]);
    for headline in headlines {
        table.push_row_with(|column| match column {
            "Metric" => CellValue::text(headline.label),
            _ => CellValue::text(headline.display.clone()),
        });
    }
    table.finish()
}

/// Concatenates tables under a label column naming each part (for example
/// videos and shorts under `Content Type`). Columns are the union in
/// first-seen order; cells a part lacks are missing. Estimate flags carry
/// over.
pub fn stack_labelled(parts: &[(&str, &NormalizedTable)], label_column: &str) -> NormalizedTable {
    let mut columns: Vec<String> = Vec::new();
    for (_, table) in parts {
        for column in table.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns.push(label_column.to_string());

    let mut out = TableBuilder::new(columns);
    for (label, table) in parts {
        let names = table.columns();
        for row in table.rows() {
            out.push_row_with(|column| {
                if column == label_column {
                    return CellValue::text(*label);
                }
                names
                    .iter()
                    .position(|name| name == column)
                    .and_then(|idx| row.get(idx).cloned())
                    .unwrap_or(CellValue::Missing)
            });
        }
    }
    let mut out = out.finish();
    for (_, table) in parts {
        for column in table.estimated_columns() {
            out.mark_estimated(column);
        }
    }
    out
}

/// Writes each section as a title record followed by its header and rows.
pub fn write_sections<W: Write>(
    writer: W,
    sections: &[SummarySection],
    options: CsvExportOptions,
) -> Result<()> {
    let mut out = WriterBuilder::new().flexible(true).from_writer(writer);
    for section in sections {
        out.write_record([section.title.as_str()])
            .with_context(|| format!("write section title {}", section.title))?;
        write_records(&mut out, &section.table, options)
            .with_context(|| format!("write section {}", section.title))?;
    }
    out.flush().context("flush summary output")?;
    Ok(())
}

pub fn write_sections_file(
    path: &Path,
    sections: &[SummarySection],
    options: CsvExportOptions,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_sections(BufWriter::new(file), sections, options)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), sections = sections.len(), "wrote summary export");
    Ok(())
}
