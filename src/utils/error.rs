//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while talking to the trace-query endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid trace-query response: {0}")]
    InvalidResponse(String),

    #[error("Trace not found: {0}")]
    TraceNotFound(String),
}

/// A span that cannot be placed in a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed span #{span_index} in trace #{trace_index}: {reason}")]
pub struct MalformedSpanError {
    /// Position of the trace in the input list
    pub trace_index: usize,

    /// Position of the span inside its trace
    pub span_index: usize,

    pub reason: MalformedReason,
}

/// Why a span was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("missing span id")]
    MissingSpanId,

    #[error("missing start time")]
    MissingStartTime,

    #[error("invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("not a JSON object")]
    NotAnObject,
}

/// Errors that can occur during trace parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    MalformedSpan(#[from] MalformedSpanError),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Flame profile has no samples")]
    EmptyProfile,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
