//! Report ingestion.
//!
//! Turns saved vendor payloads and exported report files into the raw inputs
//! the normalizers consume. Nothing here interprets values.

pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod response;
pub mod vendor;

pub use csv_table::{CsvOptions, CsvTable, parse_report_csv, read_report_csv};
pub use discovery::{expand_inputs, list_csv_files};
pub use error::{IngestError, Result};
pub use response::{
    ApiError, ReportResponse, ResponseBody, read_report_response, read_response_body,
};
