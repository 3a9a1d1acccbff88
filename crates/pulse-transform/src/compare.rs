//! Period-over-period comparison and channel aggregation.

use polars::prelude::*;
use pulse_model::{
    CellValue, ComparisonRow, MetricComparison, NormalizedTable, PercentChange, Result,
    TableBuilder,
};
use tracing::debug;

use crate::frame::key_totals;

const PREVIOUS_ORDER: &str = "_previous_order";
const CURRENT_ORDER: &str = "_current_order";
const CURRENT_SUFFIX: &str = "_current";

/// `((current - previous) / previous) × 100` with the zero-baseline cases
/// reported as `N/A` (both zero) and `New` (previous zero).
pub fn percent_change(previous: f64, current: f64) -> PercentChange {
    PercentChange::between(previous, current)
}

/// Outer-joins two periods on `key`, one row per key found in either table.
///
/// Rows appear in first-seen order: previous-period keys first, then keys
/// only present in the current period. A key absent from one side, a
/// missing metric column, or a missing value all count as zero. Duplicate
/// keys within one table are summed. Rows with a missing key are skipped.
pub fn compare_tables(
    previous: &NormalizedTable,
    current: &NormalizedTable,
    key: &str,
    metrics: &[&str],
) -> Result<Vec<ComparisonRow>> {
    let before = key_totals(previous, key, metrics)?
        .lazy()
        .with_row_index(PREVIOUS_ORDER, None);
    let after = key_totals(current, key, metrics)?
        .lazy()
        .with_row_index(CURRENT_ORDER, None);
    let join = JoinArgs::new(JoinType::Full)
        .with_coalesce(JoinCoalesce::CoalesceColumns)
        .with_suffix(Some(CURRENT_SUFFIX.into()));
    let joined = before
        .join(after, [col(key)], [col(key)], join)
        .sort(
            [PREVIOUS_ORDER, CURRENT_ORDER],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;
    let joined = NormalizedTable::from_frame(joined);

    let keys = joined.column(key).unwrap_or_default();
    let in_previous = joined.column(PREVIOUS_ORDER).unwrap_or_default();
    let in_current = joined.column(CURRENT_ORDER).unwrap_or_default();
    let values = |name: &str| joined.numeric_column(name).unwrap_or_default();
    let previous_values: Vec<Vec<Option<f64>>> = metrics.iter().map(|m| values(m)).collect();
    let current_values: Vec<Vec<Option<f64>>> = metrics
        .iter()
        .map(|m| values(&format!("{m}{CURRENT_SUFFIX}")))
        .collect();

    let value_at = |column: &[Option<f64>], row: usize| {
        column.get(row).copied().flatten().unwrap_or_default()
    };
    let rows: Vec<ComparisonRow> = keys
        .iter()
        .enumerate()
        .map(|(row, k)| ComparisonRow {
            key: k.to_string(),
            in_previous: in_previous.get(row).is_some_and(|v| !v.is_missing()),
            in_current: in_current.get(row).is_some_and(|v| !v.is_missing()),
            metrics: metrics
                .iter()
                .enumerate()
                .map(|(idx, metric)| {
                    MetricComparison::new(
                        *metric,
                        value_at(&previous_values[idx], row),
                        value_at(&current_values[idx], row),
                    )
                })
                .collect(),
        })
        .collect();
    debug!(key, rows = rows.len(), "compared periods");
    Ok(rows)
}

/// Renders comparison rows as a table with, per metric,
/// `"{m} (Period 1)"`, `"{m} (Period 2)"` and `"{m} Change"` columns.
pub fn comparison_table(rows: &[ComparisonRow], metrics: &[&str], key: &str) -> NormalizedTable {
    let mut columns = vec![key.to_string()];
    for metric in metrics {
        columns.push(format!("{metric} (Period 1)"));
        columns.push(format!("{metric} (Period 2)"));
        columns.push(format!("{metric} Change"));
    }
    let mut table = TableBuilder::new(columns);
    for row in rows {
        let mut cells = vec![CellValue::text(row.key.clone())];
        for metric in metrics {
            match row.metric(metric) {
                Some(m) => {
                    cells.push(CellValue::number(m.previous));
                    cells.push(CellValue::number(m.current));
                    cells.push(CellValue::text(m.change.to_string()));
                }
                None => cells.extend([CellValue::Missing, CellValue::Missing, CellValue::Missing]),
            }
        }
        let mut cells = cells.into_iter();
        table.push_row_with(|_| cells.next().unwrap_or(CellValue::Missing));
    }
    table.finish()
}

/// Sums `metrics` per value of `channel_column`, restricted to `channels`
/// and in their order. Channels without data get a zero row.
pub fn aggregate_channels(
    table: &NormalizedTable,
    channel_column: &str,
    channels: &[&str],
    metrics: &[&str],
) -> Result<NormalizedTable> {
    let sums = NormalizedTable::from_frame(key_totals(table, channel_column, metrics)?);
    let keys = sums.column(channel_column).unwrap_or_default();
    let mut out = TableBuilder::new(std::iter::once(channel_column).chain(metrics.iter().copied()));
    for channel in channels {
        let row = keys.iter().position(|k| k.as_str() == Some(*channel));
        out.push_row_with(|column| {
            if column == channel_column {
                return CellValue::text(*channel);
            }
            let total = row
                .and_then(|row| sums.value(row, column))
                .and_then(|v| v.as_f64())
                .unwrap_or_default();
            CellValue::number(total)
        });
    }
    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(rows: &[(&str, f64)]) -> NormalizedTable {
        NormalizedTable::from_rows(
            ["landingPage", "sessions"],
            rows.iter()
                .map(|(page, sessions)| vec![CellValue::text(*page), CellValue::Number(*sessions)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn percent_change_edge_cases() {
        assert_eq!(percent_change(0.0, 0.0).to_string(), "N/A");
        assert_eq!(percent_change(0.0, 50.0).to_string(), "New");
        assert_eq!(percent_change(200.0, 100.0).to_string(), "-50.00%");
    }

    #[test]
    fn outer_join_keeps_keys_from_both_periods() {
        let previous = pages(&[("/a", 10.0), ("/b", 4.0)]);
        let current = pages(&[("/b", 6.0), ("/c", 3.0)]);
        let rows = compare_tables(&previous, &current, "landingPage", &["sessions"]).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["/a", "/b", "/c"]);
        assert_eq!(rows[0].metrics[0].current, 0.0);
        assert!(!rows[0].in_current);
        assert_eq!(rows[1].metrics[0].change.to_string(), "50.00%");
        assert_eq!(rows[2].metrics[0].change, PercentChange::New);
    }

    #[test]
    fn duplicate_keys_are_summed_before_joining() {
        let previous = pages(&[("/a", 1.0), ("/a", 2.0)]);
        let current = NormalizedTable::from_rows(
            ["landingPage", "sessions"],
            vec![
                vec![CellValue::Missing, CellValue::Number(9.0)],
                vec![CellValue::text("/a"), CellValue::Missing],
            ],
        )
        .unwrap();
        let rows =
            compare_tables(&previous, &current, "landingPage", &["sessions", "users"]).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].in_previous && rows[0].in_current);
        assert_eq!(rows[0].metrics[0].previous, 3.0);
        assert_eq!(rows[0].metrics[0].current, 0.0);
        assert_eq!(rows[0].metrics[1].change, PercentChange::NotApplicable);
    }

    #[test]
    fn comparison_table_columns() {
        let rows = compare_tables(
            &pages(&[("/a", 2.0)]),
            &pages(&[("/a", 3.0)]),
            "landingPage",
            &["sessions"],
        )
        .unwrap();
        let table = comparison_table(&rows, &["sessions"], "landingPage");
        assert_eq!(
            table.columns(),
            [
                "landingPage",
                "sessions (Period 1)",
                "sessions (Period 2)",
                "sessions Change"
            ]
        );
        assert_eq!(table.value(0, "sessions Change"), Some(CellValue::text("50.00%")));
    }

    #[test]
    fn channels_are_summed_and_zero_filled() {
        let table = NormalizedTable::from_rows(
            ["sessionDefaultChannelGrouping", "sessions"],
            vec![
                vec![CellValue::text("Direct"), CellValue::Number(5.0)],
                vec![CellValue::text("Direct"), CellValue::Number(7.0)],
                vec![CellValue::text("Referral"), CellValue::Number(1.0)],
            ],
        )
        .unwrap();
        let out = aggregate_channels(
            &table,
            "sessionDefaultChannelGrouping",
            &["Direct", "Organic Search"],
            &["sessions"],
        )
        .unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.value(0, "sessions"), Some(CellValue::Number(12.0)));
        assert_eq!(out.value(1, "sessions"), Some(CellValue::Number(0.0)));
    }
}
