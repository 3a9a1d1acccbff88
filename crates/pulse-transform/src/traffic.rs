//! Fallback and derived columns for the web-traffic time series.
//!
//! Vendors return different metric subsets per account tier, so the traffic
//! table is completed with estimates until every required column exists.
//! Existing columns are never overwritten.

use polars::prelude::*;
use pulse_model::{CellValue, NormalizedTable, Result, TRAFFIC_REQUIRED_COLUMNS};
use tracing::debug;

use crate::frame::trailing_window;
use crate::normalization::{ratio, scale};
use crate::normalize::{DATE_COLUMN, add_derived_column as add};

/// Share of `totalUsers` assumed new when the vendor omits `newUsers`.
pub const NEW_USER_SHARE: f64 = 0.7;
/// Share of `totalUsers` assumed returning when the vendor omits `newUsers`.
pub const RETURNING_USER_SHARE: f64 = 0.3;
/// Longest rolling window used for stickiness, in rows (days).
pub const STICKINESS_WINDOW: usize = 28;

/// Synthesizes missing traffic columns and orders the required ones first.
///
/// The table is expected to be date-ascending already, as produced by
/// [`normalize_records`](crate::normalize::normalize_records).
pub fn apply_traffic_fallbacks(table: &mut NormalizedTable) {
    if !table.has_column("activeUsers") && table.has_column("totalUsers") {
        let values = owned_column(table, "totalUsers");
        add(table, "activeUsers", values);
    }

    if !table.has_column("avgEngPerUser") {
        let values = if table.has_column("userEngagementDuration") && table.has_column("totalUsers") {
            zip_columns(table, "userEngagementDuration", "totalUsers", ratio)
        } else if table.has_column("averageSessionDuration") {
            owned_column(table, "averageSessionDuration")
        } else {
            vec![CellValue::Number(0.0); table.height()]
        };
        add(table, "avgEngPerUser", values);
    }

    if table.has_column("totalUsers") {
        if table.has_column("newUsers") {
            if !table.has_column("returningUsers") {
                let values = zip_columns(table, "totalUsers", "newUsers", difference);
                add(table, "returningUsers", values);
            }
        } else {
            let totals = owned_column(table, "totalUsers");
            let new_users = totals.iter().map(|v| scale(v, NEW_USER_SHARE)).collect();
            add(table, "newUsers", new_users);
            table.mark_estimated("newUsers");
            if !table.has_column("returningUsers") {
                let returning = totals
                    .iter()
                    .map(|v| scale(v, RETURNING_USER_SHARE))
                    .collect();
                add(table, "returningUsers", returning);
                table.mark_estimated("returningUsers");
            }
            debug!("estimated new/returning users from totalUsers");
        }
    }

    if !table.has_column("userStickiness") {
        let values = if table.has_column("activeUsers") && table.has_column("totalUsers") {
            stickiness(table).unwrap_or_else(|err| {
                debug!(error = %err, "stickiness not computed");
                vec![CellValue::Missing; table.height()]
            })
        } else {
            vec![CellValue::Number(0.0); table.height()]
        };
        add(table, "userStickiness", values);
    }

    for name in TRAFFIC_REQUIRED_COLUMNS {
        if !table.has_column(name) {
            let fill = if *name == DATE_COLUMN {
                CellValue::Missing
            } else {
                CellValue::Number(0.0)
            };
            let values = vec![fill; table.height()];
            add(table, name, values);
        }
    }
    table.reorder_columns(TRAFFIC_REQUIRED_COLUMNS);
}

/// Trailing mean over at most `window` rows, skipping missing values. The
/// window shrinks at the start of the series (minimum one observation).
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    let frame = DataFrame::new(vec![Column::new("values".into(), values.to_vec())])?;
    let means = frame
        .lazy()
        .select([col("values").rolling_mean(trailing_window(window))])
        .collect()?;
    Ok(means.column("values")?.f64()?.into_iter().collect())
}

/// `activeUsers / rollingMean(totalUsers) × 100` with a window of
/// `min(28, rows)`. A zero mean gives zero.
fn stickiness(table: &NormalizedTable) -> Result<Vec<CellValue>> {
    let window = STICKINESS_WINDOW.min(table.height());
    let active = col("activeUsers").cast(DataType::Float64);
    let mean = col("totalUsers")
        .cast(DataType::Float64)
        .rolling_mean(trailing_window(window));
    let stickiness = when(mean.clone().eq(lit(0.0)))
        .then(active.clone() * lit(0.0))
        .otherwise(active / mean * lit(100.0))
        .alias("userStickiness");
    let frame = table.lazy().select([stickiness]).collect()?;
    Ok(NormalizedTable::from_frame(frame)
        .column("userStickiness")
        .unwrap_or_default())
}

fn difference(left: &CellValue, right: &CellValue) -> CellValue {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) => CellValue::number(l - r),
        _ => CellValue::Missing,
    }
}

fn owned_column(table: &NormalizedTable, name: &str) -> Vec<CellValue> {
    table
        .column(name)
        .unwrap_or_else(|| vec![CellValue::Missing; table.height()])
}

fn zip_columns<F>(table: &NormalizedTable, left: &str, right: &str, f: F) -> Vec<CellValue>
where
    F: Fn(&CellValue, &CellValue) -> CellValue,
{
    owned_column(table, left)
        .iter()
        .zip(owned_column(table, right).iter())
        .map(|(l, r)| f(l, r))
        .collect()
}
