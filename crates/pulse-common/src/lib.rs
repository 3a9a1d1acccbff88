//! Shared utilities for pulse crates.
//!
//! Numeric parsing and formatting used by both the normalizers and the
//! exporters, plus Polars `AnyValue` helpers for the frame bridge.

pub mod numeric;
pub mod polars;

pub use numeric::{format_numeric, parse_f64, parse_percent, round_to};
pub use polars::{any_to_f64, any_to_string};
