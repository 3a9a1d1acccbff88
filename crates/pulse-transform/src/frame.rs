//! Polars building blocks shared by the derived tables: key-aligned frames,
//! stable group means and per-key totals.

use polars::prelude::*;
use pulse_model::{NormalizedTable, Result};

/// Frame holding `key` as text and each of `metrics` as `Float64`, one row
/// per table row. Metrics (or a key) the table lacks are all-null columns,
/// so frames from tables with different layouts stack cleanly.
pub fn aligned_frame(table: &NormalizedTable, key: &str, metrics: &[&str]) -> Result<DataFrame> {
    let height = table.height();
    let data = table.frame();
    let mut columns = Vec::with_capacity(metrics.len() + 1);
    columns.push(cast_or_null(data, key, height, &DataType::String)?);
    for metric in metrics {
        columns.push(cast_or_null(data, metric, height, &DataType::Float64)?);
    }
    Ok(DataFrame::new(columns)?)
}

fn cast_or_null(data: &DataFrame, name: &str, height: usize, dtype: &DataType) -> Result<Column> {
    Ok(match data.column(name) {
        Ok(column) => column.cast(dtype)?,
        Err(_) => Column::full_null(name.into(), height, dtype),
    })
}

/// Mean of each metric per distinct `key`, groups in first-seen order.
/// Rows without a key are dropped. When `count_column` is given it holds the
/// number of rows in each group.
pub fn group_means(
    frame: LazyFrame,
    key: &str,
    metrics: &[&str],
    count_column: Option<&str>,
) -> LazyFrame {
    let mut aggs: Vec<Expr> = metrics
        .iter()
        .map(|metric| col(*metric).cast(DataType::Float64).mean())
        .collect();
    if let Some(name) = count_column {
        aggs.push(len().alias(name));
    }
    frame
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg(aggs)
}

/// Sum of each metric per distinct `key` in first-seen order. Missing
/// values and absent metric columns count as zero.
pub fn key_totals(table: &NormalizedTable, key: &str, metrics: &[&str]) -> Result<DataFrame> {
    let sums: Vec<Expr> = metrics
        .iter()
        .map(|metric| col(*metric).fill_null(lit(0.0)).sum())
        .collect();
    Ok(aligned_frame(table, key, metrics)?
        .lazy()
        .filter(col(key).is_not_null())
        .group_by_stable([col(key)])
        .agg(sums)
        .collect()?)
}

/// Trailing window of `window` rows that shrinks at the start of a series,
/// down to a single observation.
pub fn trailing_window(window: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: window.max(1),
        min_periods: 1,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use pulse_model::CellValue;

    use super::*;

    fn visits() -> NormalizedTable {
        NormalizedTable::from_rows(
            ["page", "views", "label"],
            vec![
                vec![CellValue::text("/b"), CellValue::Count(4), CellValue::text("x")],
                vec![CellValue::text("/a"), CellValue::Missing, CellValue::text("y")],
                vec![CellValue::text("/b"), CellValue::Count(8), CellValue::text("z")],
                vec![CellValue::Missing, CellValue::Count(100), CellValue::text("w")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn aligned_frame_fills_absent_metrics() {
        let df = aligned_frame(&visits(), "page", &["views", "clicks"]).unwrap();
        assert_eq!(df.shape(), (4, 3));
        assert_eq!(df.column("views").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("clicks").unwrap().null_count(), 4);
    }

    #[test]
    fn group_means_keep_first_seen_order() {
        let df = group_means(visits().lazy(), "page", &["views"], Some("rows"))
            .collect()
            .unwrap();
        let table = NormalizedTable::from_frame(df);
        assert_eq!(table.height(), 2);
        assert_eq!(table.value(0, "page"), Some(CellValue::text("/b")));
        assert_eq!(table.value(0, "views"), Some(CellValue::Number(6.0)));
        assert_eq!(table.value(0, "rows"), Some(CellValue::Count(2)));
        assert_eq!(table.value(1, "views"), Some(CellValue::Missing));
    }

    #[test]
    fn key_totals_count_missing_as_zero() {
        let table = NormalizedTable::from_frame(key_totals(&visits(), "page", &["views", "clicks"]).unwrap());
        assert_eq!(table.columns(), ["page", "views", "clicks"]);
        assert_eq!(table.value(0, "views"), Some(CellValue::Number(12.0)));
        assert_eq!(table.value(1, "views"), Some(CellValue::Number(0.0)));
        assert_eq!(table.value(1, "clicks"), Some(CellValue::Number(0.0)));
    }
}
