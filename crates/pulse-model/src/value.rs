//! Typed cell values.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display format for calendar dates in normalized tables.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single typed value in a [`NormalizedTable`](crate::NormalizedTable).
///
/// `Missing` is the missing-value marker: values that failed to parse are
/// stored as `Missing` instead of raising.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Date(NaiveDate),
    Count(u64),
    Number(f64),
    Text(String),
    Missing,
}

impl CellValue {
    /// Builds a numeric cell, mapping NaN and infinities to `Missing`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Missing
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric view of the cell. Counts widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Count(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Count(_))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Date(_) => 0,
            Self::Count(_) | Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }

    /// Total ordering used for table sorts. Missing values sort last.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let left = a.as_f64().unwrap_or_default();
                let right = b.as_f64().unwrap_or_default();
                left.total_cmp(&right)
            }
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Count(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        Self::Count(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_numbers_become_missing() {
        assert_eq!(CellValue::number(f64::NAN), CellValue::Missing);
        assert_eq!(CellValue::number(f64::INFINITY), CellValue::Missing);
        assert_eq!(CellValue::number(1.5), CellValue::Number(1.5));
    }

    #[test]
    fn missing_sorts_last() {
        let mut values = vec![
            CellValue::Missing,
            CellValue::Number(3.0),
            CellValue::Count(1),
        ];
        values.sort_by(CellValue::sort_cmp);
        assert_eq!(
            values,
            vec![
                CellValue::Count(1),
                CellValue::Number(3.0),
                CellValue::Missing
            ]
        );
    }

    #[test]
    fn dates_display_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-03-09");
        assert_eq!(CellValue::Missing.to_string(), "");
    }
}
