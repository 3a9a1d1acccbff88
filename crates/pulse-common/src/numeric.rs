/// Parses a string as `f64`, returning `None` for invalid or empty strings.
///
/// Non-finite results (`"NaN"`, `"inf"`) are rejected so they surface as
/// missing values rather than poisoning sums.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a percentage such as `"42.5%"` or `"42.5"` into `42.5`.
pub fn parse_percent(value: &str) -> Option<f64> {
    parse_f64(value.trim().trim_end_matches('%'))
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Formats a floating-point number without trailing zeros.
///
/// # Examples
///
/// ```
/// use pulse_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(100.0), "100");
/// assert_eq!(format_numeric(-0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
