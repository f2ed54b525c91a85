//! Trace parsing and schema definitions.
//!
//! This module handles:
//! - Parsing raw JSON from the trace-query API
//! - Applying the malformed-span policy
//! - Defining input and output schema

pub mod schema;
pub mod trace_json;

// Re-export main types
pub use schema::{HotSpan, Process, ProfileReport, ServiceTime, Span, Trace};
pub use trace_json::{
    parse_span, parse_traces, parse_traces_str, to_report, MalformedPolicy, ParsedTraces,
};
