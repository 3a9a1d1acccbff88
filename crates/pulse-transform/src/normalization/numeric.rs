//! Numeric normalization utilities.

use pulse_common::parse_f64;
use pulse_model::CellValue;

/// Coerces a raw value to a float cell; anything unparseable is `Missing`.
pub fn coerce_number(raw: Option<&str>) -> CellValue {
    raw.and_then(parse_f64).map_or(CellValue::Missing, CellValue::Number)
}

/// Coerces a raw value to a count. Unparseable or empty values count as
/// zero and fractions are truncated.
pub fn coerce_count(raw: Option<&str>) -> CellValue {
    let value = raw.and_then(parse_f64).unwrap_or_default();
    CellValue::Count(value.max(0.0) as u64)
}

/// `numerator / denominator`. A missing operand yields `Missing`; a zero
/// denominator yields `0.0`.
pub fn ratio(numerator: &CellValue, denominator: &CellValue) -> CellValue {
    match (numerator.as_f64(), denominator.as_f64()) {
        (Some(_), Some(d)) if d == 0.0 => CellValue::Number(0.0),
        (Some(n), Some(d)) => CellValue::number(n / d),
        _ => CellValue::Missing,
    }
}

/// Multiplies a numeric cell; non-numeric cells pass through unchanged.
pub fn scale(value: &CellValue, factor: f64) -> CellValue {
    match value.as_f64() {
        Some(v) => CellValue::number(v * factor),
        None => value.clone(),
    }
}
