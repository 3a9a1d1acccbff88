//! Per-shape normalization entry point.

use pulse_ingest::ReportResponse;
use pulse_model::{NormalizedTable, ReportKind, ReportShape};
use tracing::info;

use crate::normalize::{empty_table, normalize_response};
use crate::ranked::apply_ranked_rules;
use crate::search::apply_search_rules;
use crate::traffic::apply_traffic_fallbacks;

/// Normalizes a response for `shape`, applying the shape's completion rules.
///
/// An absent response is treated like an empty one: the result has zero rows
/// but still carries the declared columns, plus every required column for
/// the traffic shape.
pub fn normalize_report(shape: &ReportShape, response: Option<&ReportResponse>) -> NormalizedTable {
    let mut table = match response {
        Some(response) => normalize_response(response, shape),
        None => empty_table(shape),
    };
    match shape.kind {
        ReportKind::Traffic => apply_traffic_fallbacks(&mut table),
        ReportKind::Search => apply_search_rules(&mut table),
        ReportKind::TopPages | ReportKind::Keywords | ReportKind::LandingPages => {
            apply_ranked_rules(&mut table, shape);
        }
        ReportKind::Channels => {}
    }
    info!(
        report = %shape.kind,
        rows = table.height(),
        columns = table.width(),
        "report normalized"
    );
    table
}
