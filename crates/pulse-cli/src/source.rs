//! Saved vendor responses as a [`ReportSource`].

use std::path::{Path, PathBuf};

use pulse_ingest::{ApiError, ReportResponse, ResponseBody, read_response_body};
use pulse_model::{PulseError, ReportRequest};
use pulse_transform::ReportSource;
use tracing::debug;

/// Serves the primary request from one saved body and the reduced request
/// from another, when one was saved.
#[derive(Debug, Clone)]
pub struct FileReportSource {
    name: String,
    primary: PathBuf,
    reduced: Option<PathBuf>,
}

impl FileReportSource {
    pub fn new(primary: impl Into<PathBuf>, reduced: Option<PathBuf>) -> Self {
        let primary = primary.into();
        let name = primary
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("response")
            .to_string();
        Self {
            name,
            primary,
            reduced,
        }
    }

    fn path_for(&self, request: &ReportRequest) -> Option<&Path> {
        let shape = request.kind.shape();
        let is_primary = request
            .metrics
            .iter()
            .map(String::as_str)
            .eq(shape.metrics.iter().copied());
        if is_primary {
            Some(&self.primary)
        } else {
            self.reduced.as_deref()
        }
    }
}

/// Vendor error bodies: refused field sets can be retried with fewer
/// metrics, anything else cannot.
pub fn classify_api_error(error: &ApiError) -> PulseError {
    if error.is_invalid_argument() {
        PulseError::PartialMetricUnavailable {
            reason: error.message.clone(),
        }
    } else {
        let code = error
            .code
            .map_or_else(|| "error".to_string(), |code| code.to_string());
        PulseError::SourceUnavailable {
            reason: format!("{code}: {}", error.message),
        }
    }
}

impl ReportSource for FileReportSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_report(&self, request: &ReportRequest) -> Result<ReportResponse, PulseError> {
        let path = self.path_for(request).ok_or_else(|| PulseError::SourceUnavailable {
            reason: "no saved response for the reduced metric set".to_string(),
        })?;
        debug!(path = %path.display(), metrics = request.metrics.len(), "reading saved response");
        match read_response_body(path)? {
            ResponseBody::Report(response) => Ok(response),
            ResponseBody::Error(error) => Err(classify_api_error(&error)),
        }
    }
}
