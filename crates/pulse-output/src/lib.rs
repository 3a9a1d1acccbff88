//! Report output.
//!
//! - **delimited**: one normalized table as comma-separated text
//! - **sections**: headline figures and tables in one titled export

mod common;
pub mod delimited;
pub mod sections;

pub use common::{EXPORT_DECIMALS, ensure_parent_dir, export_cell, is_hidden_column};
pub use delimited::{
    CsvExportOptions, export_columns, table_to_csv_string, write_table_csv, write_table_csv_file,
};
pub use sections::{
    SummarySection, headline_table, stack_labelled, write_sections, write_sections_file,
};
