//! HTTP client for the Linsight trace-query endpoint.

use super::types::{ApiErrorBody, RawTraceData};
use crate::utils::config::DEFAULT_REQUEST_TIMEOUT;
use crate::utils::error::RpcError;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Client for fetching traces by id
pub struct TraceQueryClient {
    client: Client,
    base_url: String,
}

impl TraceQueryClient {
    /// Create a new client with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with custom timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RpcError::RequestFailed)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch all traces recorded for one trace id
    pub fn fetch_trace(&self, trace_id: &str) -> Result<RawTraceData, RpcError> {
        let url = trace_url(&self.base_url, trace_id);

        info!("Fetching trace {}", trace_id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(RpcError::RequestFailed)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RpcError::TraceNotFound(trace_id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(map_api_error(status, &body));
        }

        let body = response.text().map_err(RpcError::RequestFailed)?;
        decode_trace_body(&body)
    }
}

/// Decode a successful response body
fn decode_trace_body(body: &str) -> Result<RawTraceData, RpcError> {
    serde_json::from_str(body)
        .map_err(|e| RpcError::InvalidResponse(format!("Response is not valid JSON: {}", e)))
}

/// Build the trace-query URL for a trace id
fn trace_url(base_url: &str, trace_id: &str) -> String {
    format!(
        "{}/api/traces/{}",
        base_url.trim_end_matches('/'),
        trace_id.trim()
    )
}

/// Map an HTTP error response to our error type
fn map_api_error(status: StatusCode, body: &str) -> RpcError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.describe().map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    RpcError::InvalidResponse(format!("HTTP {}: {}", status, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_url() {
        assert_eq!(
            trace_url("http://localhost:3000/", "abc123"),
            "http://localhost:3000/api/traces/abc123"
        );
        assert_eq!(
            trace_url("https://linsight.example.com", " def456 "),
            "https://linsight.example.com/api/traces/def456"
        );
    }

    #[test]
    fn test_decode_trace_body() {
        let value = decode_trace_body(r#"[{"spans": []}]"#).unwrap();
        assert!(value.is_array());

        let err = decode_trace_body("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[test]
    fn test_unreachable_endpoint_is_request_failure() {
        let client = TraceQueryClient::new("http://127.0.0.1:1").unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:1");

        let err = client.fetch_trace("abc123").unwrap_err();
        assert!(matches!(err, RpcError::RequestFailed(_)));
    }

    #[test]
    fn test_map_api_error_uses_message() {
        let err = map_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"message": "invalid trace id"}"#,
        );
        assert!(err.to_string().contains("invalid trace id"));
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_map_api_error_plain_body() {
        let err = map_api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("upstream down"));
    }
}
