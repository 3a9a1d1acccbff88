//! Ranked lists: top pages, top keywords and landing pages.

use pulse_model::{CellValue, NormalizedTable, ReportShape};

use crate::normalization::{format_duration, scale};
use crate::normalize::add_derived_column;

pub const SEARCH_TERM_COLUMN: &str = "searchTerm";
/// Display value for search terms the vendor withholds.
pub const NOT_PROVIDED: &str = "(not provided)";
/// The vendor's own placeholder, rewritten to [`NOT_PROVIDED`].
pub const NOT_SET: &str = "(not set)";
pub const DURATION_COLUMN: &str = "averageSessionDuration";
pub const DURATION_DISPLAY_COLUMN: &str = "durationFormatted";

/// Percentage rescale, sort and truncation for ranked shapes.
pub fn apply_ranked_rules(table: &mut NormalizedTable, shape: &ReportShape) {
    table.map_column("engagementRate", |value| scale(value, 100.0));

    if table.has_column(DURATION_COLUMN) && !table.has_column(DURATION_DISPLAY_COLUMN) {
        let formatted = table
            .numeric_column(DURATION_COLUMN)
            .unwrap_or_default()
            .into_iter()
            .map(|seconds| seconds.map_or(CellValue::Missing, |s| CellValue::text(format_duration(s))))
            .collect();
        add_derived_column(table, DURATION_DISPLAY_COLUMN, formatted);
    }

    if shape.dimensions.contains(&SEARCH_TERM_COLUMN) {
        apply_search_term_placeholder(table);
    }

    if let Some(metric) = shape.ranking_metric {
        top_n(table, metric, shape.limit);
    }
}

/// Fills a withheld `searchTerm` dimension with `"(not provided)"` and
/// rewrites the vendor's `"(not set)"` to the same value.
pub fn apply_search_term_placeholder(table: &mut NormalizedTable) {
    if !table.has_column(SEARCH_TERM_COLUMN) {
        let placeholders = vec![CellValue::text(NOT_PROVIDED); table.height()];
        add_derived_column(table, SEARCH_TERM_COLUMN, placeholders);
        return;
    }
    table.map_column(SEARCH_TERM_COLUMN, |value| match value.as_str() {
        Some(NOT_SET) => CellValue::text(NOT_PROVIDED),
        _ => value.clone(),
    });
}

/// Sorts descending by `metric` (missing last) and keeps at most `limit`
/// rows. Tables without the metric keep their order.
pub fn top_n(table: &mut NormalizedTable, metric: &str, limit: Option<usize>) {
    table.sort_by_column(metric, true);
    if let Some(limit) = limit {
        table.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use pulse_model::ReportKind;

    use super::*;

    #[test]
    fn keywords_without_search_term_get_placeholder() {
        let mut table = NormalizedTable::from_rows(
            ["sessionSource", "sessions"],
            vec![
                vec![CellValue::text("google"), CellValue::Number(3.0)],
                vec![CellValue::text("bing"), CellValue::Number(8.0)],
            ],
        )
        .unwrap();
        apply_ranked_rules(&mut table, &ReportKind::Keywords.shape());
        assert_eq!(table.value(0, "sessionSource"), Some(CellValue::text("bing")));
        let terms = table.column(SEARCH_TERM_COLUMN).unwrap();
        assert!(terms.iter().all(|t| t.as_str() == Some(NOT_PROVIDED)));
    }

    #[test]
    fn not_set_search_terms_are_rewritten() {
        let mut table = NormalizedTable::from_rows(
            [SEARCH_TERM_COLUMN],
            vec![vec![CellValue::text(NOT_SET)], vec![CellValue::text("rust csv")]],
        )
        .unwrap();
        apply_search_term_placeholder(&mut table);
        assert_eq!(table.value(0, SEARCH_TERM_COLUMN), Some(CellValue::text(NOT_PROVIDED)));
        assert_eq!(table.value(1, SEARCH_TERM_COLUMN), Some(CellValue::text("rust csv")));
    }

    #[test]
    fn pages_get_percent_and_formatted_duration() {
        let mut table = NormalizedTable::from_rows(
            ["pagePath", "screenPageViews", "engagementRate", DURATION_COLUMN],
            vec![
                vec![
                    CellValue::text("/a"),
                    CellValue::Number(5.0),
                    CellValue::Number(0.5),
                    CellValue::Number(125.0),
                ],
                vec![
                    CellValue::text("/b"),
                    CellValue::Number(50.0),
                    CellValue::Number(0.25),
                    CellValue::Missing,
                ],
            ],
        )
        .unwrap();
        apply_ranked_rules(&mut table, &ReportKind::TopPages.shape());
        assert_eq!(table.value(0, "pagePath"), Some(CellValue::text("/b")));
        assert_eq!(table.value(0, "engagementRate"), Some(CellValue::Number(25.0)));
        assert_eq!(table.value(0, DURATION_DISPLAY_COLUMN), Some(CellValue::Missing));
        assert_eq!(
            table.value(1, DURATION_DISPLAY_COLUMN),
            Some(CellValue::text("2m 5s"))
        );
    }

    #[test]
    fn top_n_truncates_after_sort() {
        let rows = (0..15).map(|i| vec![CellValue::Number(f64::from(i))]).collect();
        let mut table = NormalizedTable::from_rows(["sessions"], rows).unwrap();
        top_n(&mut table, "sessions", Some(10));
        assert_eq!(table.height(), 10);
        assert_eq!(table.value(0, "sessions"), Some(CellValue::Number(14.0)));
    }
}
