//! Ingestion of exported page-analytics CSV reports.
//!
//! Each export is recognised by its header, typed, tagged with its source
//! file and then merged with the others: one row per page, numeric columns
//! averaged, contributing files recorded in a provenance column.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use pulse_common::parse_percent;
use pulse_ingest::CsvTable;
use pulse_model::{CellValue, NormalizedTable, Result, TableBuilder};
use tracing::{info, warn};

use crate::frame::{aligned_frame, group_means};
use crate::normalization::{coerce_count, parse_clock_duration};

pub const PAGE_COLUMN: &str = "Page";
pub const LANDING_PAGE_COLUMN: &str = "Landing Page";
/// Provenance column; names starting with `_` are hidden from exports.
pub const SOURCE_FILES_COLUMN: &str = "_source_files";

/// Recognised export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagesenseLayout {
    LandingPage,
    PageAnalytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Percent,
    Count,
    Duration,
}

impl PagesenseLayout {
    /// Landing-page exports take precedence when both keys are present.
    pub fn detect(headers: &[String]) -> Option<Self> {
        if headers.iter().any(|h| h == LANDING_PAGE_COLUMN) {
            Some(Self::LandingPage)
        } else if headers.iter().any(|h| h == PAGE_COLUMN) {
            Some(Self::PageAnalytics)
        } else {
            None
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            Self::LandingPage => LANDING_PAGE_COLUMN,
            Self::PageAnalytics => PAGE_COLUMN,
        }
    }

    fn metrics(self) -> &'static [(&'static str, ColumnKind)] {
        match self {
            Self::LandingPage => &[
                ("% New Sessions", ColumnKind::Percent),
                ("New Visitors", ColumnKind::Count),
                ("Average Session Duration", ColumnKind::Duration),
            ],
            Self::PageAnalytics => &[
                ("Page Views", ColumnKind::Count),
                ("Average Time on page", ColumnKind::Duration),
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LandingPage => "landing page",
            Self::PageAnalytics => "page analytics",
        }
    }
}

/// One typed export: key renamed to `Page`, metric columns in layout order.
#[derive(Debug, Clone)]
pub struct PagesenseFile {
    pub source: String,
    pub layout: PagesenseLayout,
    pub table: NormalizedTable,
}

/// Types one export. Returns `None` for unknown layouts.
///
/// Percentages lose their `%` (unparseable ones become missing), counts
/// default to zero, and clock durations become whole seconds.
pub fn parse_pagesense(csv: &CsvTable) -> Option<PagesenseFile> {
    let layout = PagesenseLayout::detect(&csv.headers)?;
    let key_index = csv.column_index(layout.key_column())?;
    let metric_indices: Vec<(usize, &str, ColumnKind)> = layout
        .metrics()
        .iter()
        .filter_map(|(name, kind)| csv.column_index(name).map(|idx| (idx, *name, *kind)))
        .collect();

    let mut table = TableBuilder::new(
        std::iter::once(PAGE_COLUMN).chain(metric_indices.iter().map(|(_, name, _)| *name)),
    );
    for row in &csv.rows {
        let cell = |idx: usize| row.get(idx).map(String::as_str);
        table.push_row_with(|column| {
            if column == PAGE_COLUMN {
                return cell(key_index).map_or(CellValue::Missing, CellValue::text);
            }
            let Some((idx, _, kind)) = metric_indices.iter().find(|(_, name, _)| *name == column)
            else {
                return CellValue::Missing;
            };
            let raw = cell(*idx);
            match kind {
                ColumnKind::Percent => raw
                    .and_then(parse_percent)
                    .map_or(CellValue::Missing, CellValue::Number),
                ColumnKind::Count => coerce_count(raw),
                ColumnKind::Duration => CellValue::Count(raw.map_or(0, parse_clock_duration)),
            }
        });
    }
    let mut table = table.finish();
    table.add_source_file(csv.source.clone());
    Some(PagesenseFile {
        source: csv.source.clone(),
        layout,
        table,
    })
}

/// Result of merging several exports.
#[derive(Debug, Clone, Default)]
pub struct PagesenseReport {
    /// One row per page, sorted by page, numeric columns averaged.
    pub table: NormalizedTable,
    /// Files that were merged, with their layout, in input order.
    pub files: Vec<(String, PagesenseLayout)>,
    /// Files skipped because their layout was not recognised.
    pub skipped: Vec<String>,
    pages_by_source: BTreeMap<String, BTreeSet<String>>,
}

impl PagesenseReport {
    /// Merged rows for the pages one source file contributed.
    pub fn filter_by_source(&self, source: &str) -> NormalizedTable {
        let mut table = self.table.clone();
        let pages = self.pages_by_source.get(source);
        let Some(key) = table.column_index(PAGE_COLUMN) else {
            return table;
        };
        table.retain_rows(|row| {
            row.get(key)
                .and_then(CellValue::as_str)
                .is_some_and(|page| pages.is_some_and(|p| p.contains(page)))
        });
        table
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(name, _)| name.as_str())
    }
}

/// Parses and merges exports. Unknown layouts are skipped with a warning and
/// do not affect the other files.
pub fn merge_pagesense(inputs: &[CsvTable]) -> Result<PagesenseReport> {
    let mut report = PagesenseReport::default();
    let mut parsed = Vec::new();
    for csv in inputs {
        match parse_pagesense(csv) {
            Some(file) => {
                report.files.push((file.source.clone(), file.layout));
                parsed.push(file);
            }
            None => {
                warn!(source = %csv.source, "unknown report layout; file skipped");
                report.skipped.push(csv.source.clone());
            }
        }
    }

    // Union of metric columns in first-seen order.
    let mut metric_columns: Vec<String> = Vec::new();
    for file in &parsed {
        for column in file.table.columns().into_iter().skip(1) {
            if !metric_columns.contains(&column) {
                metric_columns.push(column);
            }
        }
    }
    let metrics: Vec<&str> = metric_columns.iter().map(String::as_str).collect();

    let mut sources_by_page: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut stacked: Option<DataFrame> = None;
    for file in &parsed {
        for page in file.table.column(PAGE_COLUMN).unwrap_or_default() {
            let Some(page) = page.as_str() else {
                continue;
            };
            report
                .pages_by_source
                .entry(file.source.clone())
                .or_default()
                .insert(page.to_string());
            sources_by_page
                .entry(page.to_string())
                .or_default()
                .insert(file.source.clone());
        }
        let frame = aligned_frame(&file.table, PAGE_COLUMN, &metrics)?;
        match stacked.as_mut() {
            Some(all) => {
                all.vstack_mut(&frame)?;
            }
            None => stacked = Some(frame),
        }
    }

    let mut table = match stacked {
        Some(all) => NormalizedTable::from_frame(
            group_means(all.lazy(), PAGE_COLUMN, &metrics, None)
                .sort([PAGE_COLUMN], SortMultipleOptions::default())
                .collect()?,
        ),
        None => NormalizedTable::new(std::iter::once(PAGE_COLUMN)),
    };
    let provenance = table
        .column(PAGE_COLUMN)
        .unwrap_or_default()
        .iter()
        .map(|page| {
            let names = page.as_str().and_then(|p| sources_by_page.get(p));
            names.map_or(CellValue::Missing, |names| {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                CellValue::text(names.join(", "))
            })
        })
        .collect();
    table.add_column(SOURCE_FILES_COLUMN, provenance)?;
    for (name, _) in &report.files {
        table.add_source_file(name.clone());
    }
    info!(
        files = report.files.len(),
        skipped = report.skipped.len(),
        pages = table.height(),
        "merged page reports"
    );
    report.table = table;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(source: &str, headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable {
            headers: headers.iter().map(|s| (*s).to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| (*s).to_string()).collect())
                .collect(),
            source: source.to_string(),
        }
    }

    fn landing(source: &str, rows: &[&[&str]]) -> CsvTable {
        csv(
            source,
            &[
                "Landing Page",
                "% New Sessions",
                "New Visitors",
                "Average Session Duration",
            ],
            rows,
        )
    }

    #[test]
    fn landing_page_export_is_typed() {
        let file = parse_pagesense(&landing("a.csv", &[&["/home", "45.5%", "x", "2m 5s"]])).unwrap();
        assert_eq!(file.layout, PagesenseLayout::LandingPage);
        assert_eq!(file.table.value(0, PAGE_COLUMN), Some(CellValue::text("/home")));
        assert_eq!(file.table.value(0, "% New Sessions"), Some(CellValue::Number(45.5)));
        assert_eq!(file.table.value(0, "New Visitors"), Some(CellValue::Count(0)));
        assert_eq!(
            file.table.value(0, "Average Session Duration"),
            Some(CellValue::Count(125))
        );
    }

    #[test]
    fn overlapping_pages_are_averaged_with_provenance() {
        let report = merge_pagesense(&[
            landing("b.csv", &[&["/home", "40%", "10", "1m 0s"]]),
            landing("a.csv", &[&["/home", "60%", "20", "30s"], &["/about", "10%", "2", "5s"]]),
        ])
        .unwrap();
        let table = &report.table;
        assert_eq!(table.height(), 2);
        assert_eq!(table.value(0, PAGE_COLUMN), Some(CellValue::text("/about")));
        assert_eq!(table.value(1, "% New Sessions"), Some(CellValue::Number(50.0)));
        assert_eq!(table.value(1, "New Visitors"), Some(CellValue::Number(15.0)));
        assert_eq!(
            table.value(1, "Average Session Duration"),
            Some(CellValue::Number(45.0))
        );
        assert_eq!(
            table.value(1, SOURCE_FILES_COLUMN),
            Some(CellValue::text("a.csv, b.csv"))
        );
    }

    #[test]
    fn mixed_layouts_union_columns() {
        let report = merge_pagesense(&[
            landing("l.csv", &[&["/home", "50%", "4", "10s"]]),
            csv(
                "p.csv",
                &["Page", "Page Views", "Average Time on page"],
                &[&["/home", "12", "1m 1s"], &["/blog", "3", ""]],
            ),
        ])
        .unwrap();
        let table = &report.table;
        assert_eq!(
            table.columns(),
            [
                "Page",
                "% New Sessions",
                "New Visitors",
                "Average Session Duration",
                "Page Views",
                "Average Time on page",
                SOURCE_FILES_COLUMN
            ]
        );
        assert_eq!(table.value(0, PAGE_COLUMN), Some(CellValue::text("/blog")));
        assert_eq!(table.value(0, "New Visitors"), Some(CellValue::Missing));
        assert_eq!(table.value(0, "Average Time on page"), Some(CellValue::Number(0.0)));
        let blog_only = report.filter_by_source("p.csv");
        assert_eq!(blog_only.height(), 2);
        let landing_only = report.filter_by_source("l.csv");
        assert_eq!(landing_only.height(), 1);
        assert_eq!(landing_only.value(0, "Page Views"), Some(CellValue::Number(12.0)));
    }

    #[test]
    fn unknown_layout_is_skipped() {
        let report = merge_pagesense(&[
            csv("odd.csv", &["Campaign", "Clicks"], &[&["x", "1"]]),
            landing("ok.csv", &[&["/home", "1%", "1", "1s"]]),
        ])
        .unwrap();
        assert_eq!(report.skipped, vec!["odd.csv"]);
        assert_eq!(report.source_names().collect::<Vec<_>>(), vec!["ok.csv"]);
        assert_eq!(report.table.height(), 1);
        assert!(report.filter_by_source("missing.csv").is_empty());
    }
}
