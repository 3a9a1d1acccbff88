//! Shared output helpers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pulse_common::{format_numeric, round_to};
use pulse_model::CellValue;

/// Decimal places floating cells are rounded to on export.
pub const EXPORT_DECIMALS: u32 = 2;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// Text written for one cell. Floats are rounded, then printed without
/// trailing zeros; missing values are empty.
pub fn export_cell(value: &CellValue, decimals: u32) -> String {
    match value {
        CellValue::Number(v) => format_numeric(round_to(*v, decimals)),
        CellValue::Missing => String::new(),
        other => other.to_string(),
    }
}

/// Columns starting with `_` carry provenance and are hidden by default.
pub fn is_hidden_column(name: &str) -> bool {
    name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_export_cell() {
        assert_eq!(export_cell(&CellValue::Number(12.345_67), 2), "12.35");
        assert_eq!(export_cell(&CellValue::Number(100.0), 2), "100");
        assert_eq!(export_cell(&CellValue::Number(0.5), 2), "0.5");
        assert_eq!(export_cell(&CellValue::Count(7), 2), "7");
        assert_eq!(export_cell(&CellValue::Missing, 2), "");
        assert_eq!(
            export_cell(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()), 2),
            "2024-03-09"
        );
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.csv");
        ensure_parent_dir(&path).unwrap();
        assert!(dir.path().join("nested/out").is_dir());
        ensure_parent_dir(Path::new("report.csv")).unwrap();
    }
}
