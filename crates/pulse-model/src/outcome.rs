use serde::{Deserialize, Serialize};

use crate::shape::ReportKind;
use crate::table::NormalizedTable;

/// How a sub-report was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Complete,
    /// The primary metric set was refused; the reduced set succeeded.
    Reduced { reason: String },
    /// Nothing could be fetched; the table is empty.
    Unavailable { reason: String },
}

/// Result of fetching and normalizing one sub-report.
///
/// Failures degrade to an empty table plus a reason, so sibling
/// sub-reports keep rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub kind: ReportKind,
    pub table: NormalizedTable,
    pub status: OutcomeStatus,
}

impl ReportOutcome {
    pub fn is_available(&self) -> bool {
        !matches!(self.status, OutcomeStatus::Unavailable { .. })
    }

    /// User-facing explanation for degraded outcomes.
    pub fn warning(&self) -> Option<String> {
        match &self.status {
            OutcomeStatus::Complete => None,
            OutcomeStatus::Reduced { reason } => Some(format!(
                "{}: some metrics are not available for this property ({reason})",
                self.kind
            )),
            OutcomeStatus::Unavailable { reason } => {
                Some(format!("{}: not available ({reason})", self.kind))
            }
        }
    }
}
