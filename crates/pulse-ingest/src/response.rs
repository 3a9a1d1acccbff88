//! Decoding of analytics report responses.
//!
//! The wire shape mirrors the GA4 Data API `runReport` body: header lists
//! followed by rows of positional dimension and metric values.

use std::path::Path;

use pulse_model::{RawField, RawRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRow {
    #[serde(default)]
    pub dimension_values: Vec<Value>,
    #[serde(default)]
    pub metric_values: Vec<Value>,
}

/// A deserialized report response.
///
/// Absent `rows` decodes as an empty list: a report with no data is still a
/// valid response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<Header>,
    #[serde(default)]
    pub metric_headers: Vec<Header>,
    #[serde(default)]
    pub rows: Vec<ResponseRow>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

impl ReportResponse {
    pub fn from_json_str(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|source| IngestError::Json {
            what: "report",
            source,
        })
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimension_headers.iter().map(|h| h.name.clone()).collect()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metric_headers.iter().map(|h| h.name.clone()).collect()
    }

    /// Untyped rows, each pairing values with their header names.
    pub fn records(&self) -> Vec<RawRecord> {
        let dimensions = self.dimension_names();
        let metrics = self.metric_names();
        self.rows
            .iter()
            .map(|row| RawRecord {
                dimensions: fields(&dimensions, &row.dimension_values),
                metrics: fields(&metrics, &row.metric_values),
            })
            .collect()
    }
}

fn fields(headers: &[String], values: &[Value]) -> Vec<RawField> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| RawField {
            name: name.clone(),
            value: values.get(idx).and_then(|v| v.value.clone()),
        })
        .collect()
}

/// Error body returned instead of a report, e.g. when a requested metric is
/// not valid for the property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiError {
    /// The request itself was refused (unknown or incompatible fields), as
    /// opposed to the service failing.
    pub fn is_invalid_argument(&self) -> bool {
        self.status.as_deref() == Some("INVALID_ARGUMENT") || self.code == Some(400)
    }
}

/// A saved response body: either a report or a vendor error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Report(ReportResponse),
    Error(ApiError),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(flatten)]
    report: ReportResponse,
}

impl ResponseBody {
    pub fn from_json_str(body: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(body).map_err(|source| IngestError::Json {
            what: "report",
            source,
        })?;
        Ok(match envelope.error {
            Some(error) => Self::Error(error),
            None => Self::Report(envelope.report),
        })
    }
}

/// Reads a saved response body (report or vendor error) from disk.
pub fn read_response_body(path: &Path) -> Result<ResponseBody> {
    let body = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    ResponseBody::from_json_str(&body)
}

/// Reads a saved report response from disk.
pub fn read_report_response(path: &Path) -> Result<ReportResponse> {
    let body = std::fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let response = ReportResponse::from_json_str(&body)?;
    debug!(
        path = %path.display(),
        rows = response.rows.len(),
        "loaded report response"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "dimensionHeaders": [{"name": "date"}],
        "metricHeaders": [{"name": "totalUsers", "type": "TYPE_INTEGER"}, {"name": "sessions"}],
        "rows": [
            {"dimensionValues": [{"value": "20240102"}], "metricValues": [{"value": "12"}, {"value": "15"}]},
            {"dimensionValues": [{"value": "20240101"}], "metricValues": [{"value": "9"}]}
        ],
        "rowCount": 2
    }"#;

    #[test]
    fn decodes_headers_and_rows() {
        let response = ReportResponse::from_json_str(BODY).unwrap();
        assert_eq!(response.dimension_names(), vec!["date"]);
        assert_eq!(response.metric_names(), vec!["totalUsers", "sessions"]);
        let records = response.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value("sessions"), Some("15"));
        assert_eq!(records[1].value("sessions"), None);
    }

    #[test]
    fn missing_rows_is_empty_response() {
        let response =
            ReportResponse::from_json_str(r#"{"dimensionHeaders": [{"name": "date"}]}"#).unwrap();
        assert!(response.records().is_empty());
        assert_eq!(response.dimension_names(), vec!["date"]);
    }

    #[test]
    fn error_body_is_recognised() {
        let body = r#"{"error": {"code": 400, "message": "Field organicSearches is not valid", "status": "INVALID_ARGUMENT"}}"#;
        let ResponseBody::Error(error) = ResponseBody::from_json_str(body).unwrap() else {
            panic!("expected error body");
        };
        assert!(error.is_invalid_argument());
        assert!(error.message.contains("organicSearches"));
        assert!(matches!(
            ResponseBody::from_json_str(BODY).unwrap(),
            ResponseBody::Report(_)
        ));
    }

    #[test]
    fn malformed_body_is_json_error() {
        let err = ReportResponse::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, IngestError::Json { what: "report", .. }));
    }
}
