use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use pulse_common::{any_to_f64, any_to_string};
use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};
use crate::value::CellValue;

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the epoch of Polars dates.
const UNIX_EPOCH_DAY: i32 = 719_163;

/// One row of a [`NormalizedTable`], positionally aligned with the table's
/// declared columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    cells: Vec<CellValue>,
}

impl NormalizedRow {
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// Metadata carried alongside a table's frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMeta {
    /// Columns holding estimates rather than measured values.
    pub estimated: BTreeSet<String>,
    /// Files the rows were read from, when the report came from disk.
    pub source_files: Vec<String>,
}

/// Rectangular table with named, ordered columns, stored as a Polars
/// `DataFrame`.
///
/// Every row holds exactly one value per declared column; absent source data
/// is stored as a null ([`CellValue::Missing`]) or a fallback, never omitted.
/// Column dtypes follow the cells: dates become `Date`, all-count columns
/// `UInt64`, other numeric columns `Float64`, everything else `String`, and
/// columns with no values at all stay `Null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "TableWire", try_from = "TableWire")]
pub struct NormalizedTable {
    data: DataFrame,
    meta: TableMeta,
}

impl Default for NormalizedTable {
    fn default() -> Self {
        Self::from_frame(DataFrame::empty())
    }
}

impl PartialEq for NormalizedTable {
    fn eq(&self, other: &Self) -> bool {
        self.meta == other.meta && self.columns() == other.columns() && self.rows() == other.rows()
    }
}

impl NormalizedTable {
    /// Empty table with the given declared columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableBuilder::new(columns).finish()
    }

    /// Builds a table from rows, validating every row's width.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(PulseError::DuplicateColumn(name.clone()));
            }
        }
        let mut builder = TableBuilder::new(columns);
        for row in rows {
            builder.push_row(row)?;
        }
        Ok(builder.finish())
    }

    /// Wraps a frame produced by Polars operations.
    pub fn from_frame(data: DataFrame) -> Self {
        Self {
            data,
            meta: TableMeta::default(),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.data
    }

    /// Lazy view over a copy of the frame.
    pub fn lazy(&self) -> LazyFrame {
        self.data.clone().lazy()
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn source_files(&self) -> &[String] {
        &self.meta.source_files
    }

    pub fn add_source_file(&mut self, name: impl Into<String>) {
        self.meta.source_files.push(name.into());
    }

    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Materialized rows, top to bottom.
    pub fn rows(&self) -> Vec<NormalizedRow> {
        let columns: Vec<Vec<CellValue>> = self.data.get_columns().iter().map(column_cells).collect();
        (0..self.height())
            .map(|row| NormalizedRow {
                cells: columns.iter().map(|cells| cells[row].clone()).collect(),
            })
            .collect()
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.data.get_column_index(name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<CellValue> {
        let column = self.data.column(column).ok()?;
        if row >= column.len() {
            return None;
        }
        column.get(row).ok().map(cell_from_any)
    }

    /// All values of a column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<CellValue>> {
        self.data.column(name).ok().map(column_cells)
    }

    /// Numeric view of a column; non-numeric cells map to `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|cells| cells.iter().map(CellValue::as_f64).collect())
    }

    /// Appends a new column. Existing columns are never overwritten.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(PulseError::DuplicateColumn(name));
        }
        self.check_height(values.len())?;
        self.data.with_column(build_column(&name, &values))?;
        Ok(())
    }

    /// Appends a column holding the same value on every row.
    pub fn fill_column(&mut self, name: impl Into<String>, value: &CellValue) -> Result<()> {
        let values = vec![value.clone(); self.height()];
        self.add_column(name, values)
    }

    pub fn replace_column(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if !self.has_column(name) {
            return Err(PulseError::UnknownColumn(name.to_string()));
        }
        self.check_height(values.len())?;
        self.data.with_column(build_column(name, &values))?;
        Ok(())
    }

    /// Rewrites every value of a column in place. Returns false when the
    /// column does not exist.
    pub fn map_column<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        let Some(cells) = self.column(name) else {
            return false;
        };
        let values = cells.iter().map(f).collect();
        self.replace_column(name, values).is_ok()
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if self.has_column(to) {
            return Err(PulseError::DuplicateColumn(to.to_string()));
        }
        if !self.has_column(from) {
            return Err(PulseError::UnknownColumn(from.to_string()));
        }
        self.data.rename(from, to.into())?;
        if self.meta.estimated.remove(from) {
            self.meta.estimated.insert(to.to_string());
        }
        Ok(())
    }

    /// Moves the listed columns (those that exist) to the front in the given
    /// order; the rest keep their relative order after them.
    pub fn reorder_columns(&mut self, leading: &[&str]) {
        let mut order: Vec<String> = Vec::with_capacity(self.width());
        for name in leading {
            if self.has_column(name) && !order.iter().any(|o| o == name) {
                order.push((*name).to_string());
            }
        }
        for name in self.columns() {
            if !order.contains(&name) {
                order.push(name);
            }
        }
        if let Ok(data) = self.data.select(order) {
            self.data = data;
        }
    }

    /// Keeps only the listed columns, in the listed order.
    pub fn select(&self, columns: &[&str]) -> Result<Self> {
        if let Some(unknown) = columns.iter().find(|name| !self.has_column(name)) {
            return Err(PulseError::UnknownColumn((*unknown).to_string()));
        }
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = columns.iter().find(|name| !seen.insert(**name)) {
            return Err(PulseError::DuplicateColumn((*duplicate).to_string()));
        }
        let mut table = Self::from_frame(self.data.select(columns.iter().copied())?);
        table.meta.source_files = self.meta.source_files.clone();
        for name in columns {
            if self.is_estimated(name) {
                table.mark_estimated(name);
            }
        }
        Ok(table)
    }

    /// Stable sort by one column; missing values always sort last.
    pub fn sort_by_column(&mut self, name: &str, descending: bool) -> bool {
        if !self.has_column(name) {
            return false;
        }
        let options = SortMultipleOptions::default()
            .with_order_descending(descending)
            .with_nulls_last(true)
            .with_maintain_order(true);
        match self.data.sort([name], options) {
            Ok(sorted) => {
                self.data = sorted;
                true
            }
            Err(_) => false,
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&NormalizedRow) -> bool,
    {
        let mask: Vec<bool> = self.rows().iter().map(|row| keep(row)).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &mask);
        if let Ok(data) = self.data.filter(&mask) {
            self.data = data;
        }
    }

    pub fn truncate(&mut self, len: usize) {
        if len < self.height() {
            self.data = self.data.head(Some(len));
        }
    }

    /// Flags a column as holding estimates rather than measured values.
    pub fn mark_estimated(&mut self, name: &str) {
        if self.has_column(name) {
            self.meta.estimated.insert(name.to_string());
        }
    }

    pub fn is_estimated(&self, name: &str) -> bool {
        self.meta.estimated.contains(name)
    }

    pub fn estimated_columns(&self) -> impl Iterator<Item = &str> {
        self.meta.estimated.iter().map(String::as_str)
    }

    /// Sum of the numeric values in a column (missing values skipped).
    pub fn sum(&self, name: &str) -> Option<f64> {
        let values = self.numeric_column(name)?;
        Some(values.into_iter().flatten().sum())
    }

    /// Mean of the numeric values in a column; `None` when nothing is numeric.
    pub fn mean(&self, name: &str) -> Option<f64> {
        let values: Vec<f64> = self.numeric_column(name)?.into_iter().flatten().collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    fn check_height(&self, len: usize) -> Result<()> {
        if len == self.height() {
            Ok(())
        } else {
            Err(PulseError::LengthMismatch {
                expected: self.height(),
                actual: len,
            })
        }
    }
}

/// Row-by-row builder for a [`NormalizedTable`].
///
/// Cells are collected first and each column's dtype is settled once, in
/// [`finish`](Self::finish).
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl TableBuilder {
    /// Repeated column names are dropped after their first occurrence.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        columns.retain(|name| seen.insert(name.clone()));
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, cells: Vec<CellValue>) -> Result<()> {
        if cells.len() != self.columns.len() {
            return Err(PulseError::LengthMismatch {
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Appends a row built by asking for each declared column's value in
    /// order. Cannot produce a ragged row.
    pub fn push_row_with<F>(&mut self, mut value_for: F)
    where
        F: FnMut(&str) -> CellValue,
    {
        let cells = self.columns.iter().map(|name| value_for(name)).collect();
        self.rows.push(cells);
    }

    pub fn finish(self) -> NormalizedTable {
        let mut by_column: Vec<Vec<CellValue>> =
            vec![Vec::with_capacity(self.rows.len()); self.columns.len()];
        for row in self.rows {
            for (cells, cell) in by_column.iter_mut().zip(row) {
                cells.push(cell);
            }
        }
        let columns: Vec<Column> = self
            .columns
            .iter()
            .zip(&by_column)
            .map(|(name, cells)| build_column(name, cells))
            .collect();
        // Names are unique and every column holds one value per row.
        let data = DataFrame::new(columns).unwrap_or_else(|_| DataFrame::empty());
        NormalizedTable::from_frame(data)
    }
}

fn build_column(name: &str, cells: &[CellValue]) -> Column {
    let name = PlSmallStr::from(name);
    let present: Vec<&CellValue> = cells.iter().filter(|c| !c.is_missing()).collect();
    if present.is_empty() {
        return Column::full_null(name, cells.len(), &DataType::Null);
    }
    if present.iter().all(|c| matches!(c, CellValue::Date(_))) {
        let days: Vec<Option<i32>> = cells
            .iter()
            .map(|c| c.as_date().map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAY))
            .collect();
        return Int32Chunked::new(name, &days).into_date().into_series().into();
    }
    if present.iter().all(|c| matches!(c, CellValue::Count(_))) {
        let values: Vec<Option<u64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Count(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Column::new(name, values);
    }
    if present.iter().all(|c| c.is_numeric()) {
        let values: Vec<Option<f64>> = cells.iter().map(CellValue::as_f64).collect();
        return Column::new(name, values);
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| (!c.is_missing()).then(|| c.to_string()))
        .collect();
    Column::new(name, values)
}

fn column_cells(column: &Column) -> Vec<CellValue> {
    (0..column.len())
        .map(|idx| column.get(idx).map_or(CellValue::Missing, cell_from_any))
        .collect()
}

/// Reads one Polars value back as a cell. Unsigned integers are counts,
/// other numbers are numbers, and anything without a cell kind of its own
/// becomes text.
pub fn cell_from_any(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Missing,
        AnyValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAY)
            .map_or(CellValue::Missing, CellValue::Date),
        AnyValue::UInt8(v) => CellValue::Count(u64::from(v)),
        AnyValue::UInt16(v) => CellValue::Count(u64::from(v)),
        AnyValue::UInt32(v) => CellValue::Count(u64::from(v)),
        AnyValue::UInt64(v) => CellValue::Count(v),
        AnyValue::String(s) => CellValue::text(s),
        AnyValue::StringOwned(s) => CellValue::text(s.as_str()),
        AnyValue::Int8(_)
        | AnyValue::Int16(_)
        | AnyValue::Int32(_)
        | AnyValue::Int64(_)
        | AnyValue::Float32(_)
        | AnyValue::Float64(_) => any_to_f64(value).map_or(CellValue::Missing, CellValue::number),
        other => CellValue::Text(any_to_string(other)),
    }
}

/// Serialized form of a table: declared columns plus row-major cells.
#[derive(Serialize, Deserialize)]
struct TableWire {
    columns: Vec<String>,
    rows: Vec<NormalizedRow>,
    #[serde(default)]
    estimated: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    source_files: Vec<String>,
}

impl From<NormalizedTable> for TableWire {
    fn from(table: NormalizedTable) -> Self {
        Self {
            columns: table.columns(),
            rows: table.rows(),
            estimated: table.meta.estimated,
            source_files: table.meta.source_files,
        }
    }
}

impl TryFrom<TableWire> for NormalizedTable {
    type Error = PulseError;

    fn try_from(wire: TableWire) -> Result<Self> {
        let rows = wire.rows.into_iter().map(|row| row.cells).collect();
        let mut table = Self::from_rows(wire.columns, rows)?;
        for name in &wire.estimated {
            table.mark_estimated(name);
        }
        table.meta.source_files = wire.source_files;
        Ok(table)
    }
}
