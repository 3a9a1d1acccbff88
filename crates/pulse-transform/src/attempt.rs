//! Two-step fetch: the primary metric set, then the shape's reduced set.

use pulse_ingest::ReportResponse;
use pulse_model::{DateRange, OutcomeStatus, PulseError, ReportKind, ReportOutcome, ReportRequest};
use tracing::{debug, warn};

use crate::report::normalize_report;

/// A vendor collaborator able to run one report request.
pub trait ReportSource {
    fn name(&self) -> &str;

    /// Runs `request`. A refused metric set is reported as
    /// [`PulseError::PartialMetricUnavailable`]; any other failure as
    /// [`PulseError::SourceUnavailable`].
    fn run_report(&self, request: &ReportRequest) -> Result<ReportResponse, PulseError>;
}

/// Fetches and normalizes one sub-report, never failing.
///
/// When the primary request is refused for its metric set and the shape has
/// a reduced set, the reduced request is tried once. Any remaining failure
/// yields an empty table with the reason, so sibling sub-reports still
/// render.
pub fn fetch_report<S>(source: &S, kind: ReportKind, range: DateRange) -> ReportOutcome
where
    S: ReportSource + ?Sized,
{
    let shape = kind.shape();
    let primary = shape.primary_request(range);
    debug!(source = source.name(), report = %kind, "running primary request");

    let (response, status) = match source.run_report(&primary) {
        Ok(response) => (Some(response), OutcomeStatus::Complete),
        Err(PulseError::PartialMetricUnavailable { reason }) => {
            match shape.reduced_request(range) {
                Some(reduced) => {
                    warn!(
                        source = source.name(),
                        report = %kind,
                        %reason,
                        "primary metric set refused, retrying with reduced set"
                    );
                    match source.run_report(&reduced) {
                        Ok(response) => (Some(response), OutcomeStatus::Reduced { reason }),
                        Err(err) => (None, unavailable(source.name(), kind, &err)),
                    }
                }
                None => (
                    None,
                    unavailable(
                        source.name(),
                        kind,
                        &PulseError::PartialMetricUnavailable { reason },
                    ),
                ),
            }
        }
        Err(err) => (None, unavailable(source.name(), kind, &err)),
    };

    ReportOutcome {
        kind,
        table: normalize_report(&shape, response.as_ref()),
        status,
    }
}

fn unavailable(source: &str, kind: ReportKind, err: &PulseError) -> OutcomeStatus {
    warn!(source, report = %kind, error = %err, "report unavailable");
    OutcomeStatus::Unavailable {
        reason: err.to_string(),
    }
}
