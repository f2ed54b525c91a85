//! Types for the trace-query REST API.

use serde::Deserialize;

/// Error body returned by the trace-query API
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn describe(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Raw trace-query payload (parsed later)
///
/// We keep this as `serde_json::Value` because different backends wrap the
/// trace list differently. The parser will handle validation.
pub type RawTraceData = serde_json::Value;
