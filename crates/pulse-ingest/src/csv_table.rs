use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Raw delimited report: trimmed headers plus string rows padded to the
/// header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// File name the rows came from, used for provenance.
    pub source: String,
}

impl CsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.column_index(name).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reading options for exported report files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Leading rows discarded before the header (report title banners).
    pub banner_rows: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { banner_rows: 1 }
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Parses delimited report text: banner rows are skipped, the next row is
/// the header, and fully blank rows are dropped.
pub fn parse_report_csv<R: Read>(
    input: R,
    source: &str,
    options: CsvOptions,
) -> std::result::Result<CsvTable, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if index < options.banner_rows {
            continue;
        }
        if headers.is_none() {
            headers = Some(record.iter().map(normalize_header).collect());
            continue;
        }
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let width = headers.as_ref().map_or(0, Vec::len);
        let row = (0..width)
            .map(|idx| record.get(idx).map(normalize_cell).unwrap_or_default())
            .collect();
        rows.push(row);
    }
    Ok(CsvTable {
        headers: headers.unwrap_or_default(),
        rows,
        source: source.to_string(),
    })
}

/// Reads an exported report file, naming the table after the file.
pub fn read_report_csv(path: &Path, options: CsvOptions) -> Result<CsvTable> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let table =
        parse_report_csv(file, &source_name, options).map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
    if table.headers.is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "read report csv"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_banner_and_trims_headers() {
        let text = "Pagesense export,,\n Page , Page Views ,Average Time on page\n/home,10,1m 5s\n,,\n/about,4\n";
        let table = parse_report_csv(text.as_bytes(), "pages.csv", CsvOptions::default()).unwrap();
        assert_eq!(
            table.headers,
            vec!["Page", "Page Views", "Average Time on page"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["/about", "4", ""]);
        assert_eq!(table.source, "pages.csv");
        assert!(table.has_columns(&["Page", "Page Views"]));
    }

    #[test]
    fn zero_banner_rows_reads_header_first() {
        let options = CsvOptions { banner_rows: 0 };
        let table = parse_report_csv("a,b\n1,2\n".as_bytes(), "x.csv", options).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.column_index("b"), Some(1));
    }

    #[test]
    fn banner_only_has_no_headers() {
        let table =
            parse_report_csv("banner\n".as_bytes(), "x.csv", CsvOptions::default()).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }
}
