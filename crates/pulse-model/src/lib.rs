pub mod comparison;
pub mod error;
pub mod outcome;
pub mod record;
pub mod shape;
pub mod table;
pub mod value;

pub use comparison::{ComparisonRow, MetricComparison, PercentChange};
pub use error::{PulseError, Result};
pub use outcome::{OutcomeStatus, ReportOutcome};
pub use record::{RawField, RawRecord};
pub use shape::{
    DEFAULT_CHANNELS, DateRange, KNOWN_NUMERIC_COLUMNS, ReducedRequest, ReportKind, ReportRequest,
    ReportShape, SEARCH_CTR_COLUMN, SEARCH_FILLED_COLUMNS, TRAFFIC_REQUIRED_COLUMNS,
};
pub use table::{NormalizedRow, NormalizedTable, TableBuilder, TableMeta, cell_from_any};
pub use value::{CellValue, DATE_FORMAT};
