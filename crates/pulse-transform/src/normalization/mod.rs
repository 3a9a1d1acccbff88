//! Value-level normalization used by every report shape.
//!
//! - **numeric**: string to number/count coercion and safe ratios
//! - **datetime**: report dates, vendor timestamps and display formats
//! - **duration**: clock-style and ISO 8601 durations, display formatting

pub mod datetime;
pub mod duration;
pub mod numeric;

pub use datetime::{
    format_day_month_year, parse_month, parse_report_date, parse_vendor_timestamp,
};
pub use duration::{format_duration, parse_clock_duration, parse_iso8601_duration};
pub use numeric::{coerce_count, coerce_number, ratio, scale};
