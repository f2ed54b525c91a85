//! Trace input types and the output JSON schema.
//!
//! Input types mirror the trace-query REST payload (camelCase keys).
//! `ProfileReport` is the versioned envelope we write to disk.

use crate::flamegraph::profile::FlameProfile;
use serde::{Deserialize, Serialize};

/// Service that produced a set of spans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub service_name: String,

    /// SDK / runtime language tag (e.g. "go", "nodejs")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_language: Option<String>,
}

impl Process {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            sdk_language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.sdk_language = Some(language.into());
        self
    }
}

/// One timed unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub span_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Start timestamp in nanoseconds
    pub start_time: u64,

    /// Duration in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub tags: serde_json::Value,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub events: serde_json::Value,

    /// Owning process, stamped while building the tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<Process>,
}

impl Span {
    pub fn new(span_id: impl Into<String>, start_time: u64) -> Self {
        Self {
            span_id: span_id.into(),
            parent_span_id: None,
            name: None,
            start_time,
            duration: None,
            tags: serde_json::Value::Null,
            events: serde_json::Value::Null,
            process: None,
        }
    }

    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Service name of the owning process, if stamped
    pub fn service_name(&self) -> Option<&str> {
        self.process.as_ref().map(|p| p.service_name.as_str())
    }
}

/// Spans believed to belong to one logical request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub process: Process,

    #[serde(default)]
    pub spans: Vec<Span>,
}

impl Trace {
    pub fn new(process: Process, spans: Vec<Span>) -> Self {
        Self { process, spans }
    }
}

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Where the traces came from (file path or trace id)
    pub source: String,

    /// Flamebearer profile for the flame-graph widget
    pub profile: FlameProfile,

    /// Spans with the highest self time
    pub hot_spans: Vec<HotSpan>,

    /// Self time summed per service
    pub services: Vec<ServiceTime>,

    /// Spans dropped by the parser
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_spans: Vec<String>,

    /// Timestamp when the report was generated
    pub generated_at: String,
}

/// A span ranked by self time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotSpan {
    /// "service:name" label, same as the flame profile
    pub label: String,

    pub span_id: String,

    pub self_time: u64,

    pub total: u64,

    /// Self time as a percentage of the trace total
    pub percentage: f64,
}

/// Self time attributed to one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTime {
    pub service: String,
    pub self_time: u64,
    pub span_count: usize,
}
