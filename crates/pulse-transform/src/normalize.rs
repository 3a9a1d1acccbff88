//! Response-to-table normalization shared by every report shape.

use pulse_ingest::ReportResponse;
use pulse_model::{
    CellValue, DateRange, NormalizedTable, PulseError, RawRecord, ReportShape, TableBuilder,
};
use tracing::{debug, trace};

use crate::normalization::{coerce_number, parse_report_date};

pub const DATE_COLUMN: &str = "date";

/// Builds a table whose columns are `dimension_headers + metric_headers`.
///
/// Numeric columns (per the shape) are coerced to floats, with unparseable
/// values stored as missing. A `date` column is reparsed to calendar dates
/// and the rows sorted ascending by it; otherwise the received order is kept.
/// An empty record list yields an empty table with the same columns.
pub fn normalize_records(
    records: &[RawRecord],
    dimension_headers: &[String],
    metric_headers: &[String],
    shape: &ReportShape,
) -> NormalizedTable {
    let mut builder = TableBuilder::new(dimension_headers.iter().chain(metric_headers).cloned());
    for record in records {
        builder.push_row_with(|name| coerce_cell(shape, name, record.value(name)));
    }
    let mut table = builder.finish();
    if table.has_column(DATE_COLUMN) {
        table.sort_by_column(DATE_COLUMN, false);
    }
    debug!(
        report = %shape.kind,
        rows = table.height(),
        columns = table.width(),
        "normalized records"
    );
    table
}

/// Normalizes a decoded response. A response without headers falls back to
/// the shape's declared columns.
pub fn normalize_response(response: &ReportResponse, shape: &ReportShape) -> NormalizedTable {
    if response.dimension_headers.is_empty() && response.metric_headers.is_empty() {
        return empty_table(shape);
    }
    normalize_records(
        &response.records(),
        &response.dimension_names(),
        &response.metric_names(),
        shape,
    )
}

/// Zero-row table carrying the shape's declared columns.
pub fn empty_table(shape: &ReportShape) -> NormalizedTable {
    NormalizedTable::new(shape.declared_columns())
}

/// Copy of `table` keeping rows whose `column` date lies in the range.
/// Rows with a missing date are dropped; an absent column keeps every row.
pub fn filter_date_range(table: &NormalizedTable, column: &str, range: DateRange) -> NormalizedTable {
    let mut out = table.clone();
    if let Some(idx) = out.column_index(column) {
        out.retain_rows(|row| {
            row.get(idx)
                .and_then(CellValue::as_date)
                .is_some_and(|d| range.contains(d))
        });
    }
    out
}

/// Adds a derived column the caller has just checked is absent. A refusal
/// is logged and the table left as it was.
pub(crate) fn add_derived_column(table: &mut NormalizedTable, name: &str, values: Vec<CellValue>) {
    if let Err(err) = table.add_column(name, values) {
        debug!(column = name, error = %err, "skipped derived column");
    }
}

fn coerce_cell(shape: &ReportShape, name: &str, raw: Option<&str>) -> CellValue {
    let value = if name == DATE_COLUMN {
        raw.and_then(parse_report_date)
            .map_or(CellValue::Missing, CellValue::Date)
    } else if shape.is_numeric_column(name) {
        coerce_number(raw)
    } else {
        return raw.map_or(CellValue::Missing, CellValue::text);
    };
    if let Some(raw) = raw.filter(|raw| value.is_missing() && !raw.trim().is_empty()) {
        let error = PulseError::MalformedValue {
            column: name.to_string(),
            value: raw.to_string(),
        };
        trace!(%error, "stored as missing");
    }
    value
}
