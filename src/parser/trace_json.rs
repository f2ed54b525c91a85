//! Main parser for trace-query JSON.
//!
//! Turns the raw JSON returned by the trace-query API (or saved to disk)
//! into typed `Trace` values. Malformed spans are either skipped with a
//! recorded reason or rejected, depending on `MalformedPolicy`.

use super::schema::{HotSpan, Process, ProfileReport, ServiceTime, Span, Trace};
use crate::flamegraph::profile::FlameProfile;
use crate::utils::config::{
    DURATION_FIELD_NAMES, NAME_FIELD_NAMES, PARENT_ID_FIELD_NAMES, SCHEMA_VERSION,
    SPAN_ID_FIELD_NAMES, START_TIME_FIELD_NAMES, TRACE_LIST_FIELD_NAMES, UNKNOWN_SERVICE,
};
use crate::utils::error::{MalformedReason, MalformedSpanError, ParseError};
use log::{debug, warn};
use serde_json::{Map, Value};

/// What to do with a span that cannot be placed in a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Drop the span, record why, keep going
    #[default]
    Skip,
    /// Fail on the first malformed span
    Strict,
}

/// Parsed traces plus whatever the parser had to drop
#[derive(Debug, Clone, Default)]
pub struct ParsedTraces {
    pub traces: Vec<Trace>,
    pub skipped: Vec<MalformedSpanError>,
}

impl ParsedTraces {
    pub fn span_count(&self) -> usize {
        self.traces.iter().map(|t| t.spans.len()).sum()
    }
}

/// Parse raw trace-query JSON
///
/// **Public** - main entry point for parsing
///
/// Accepts an array of traces, an object wrapping one under `traces`,
/// `data` or `result`, or a single trace object.
///
/// # Errors
/// * `ParseError::InvalidFormat` - Input is not a trace list / trace object
/// * `ParseError::MalformedSpan` - Bad span under `MalformedPolicy::Strict`
pub fn parse_traces(raw: &Value, policy: MalformedPolicy) -> Result<ParsedTraces, ParseError> {
    let trace_values = extract_trace_list(raw)?;
    debug!("Parsing {} traces", trace_values.len());

    let mut parsed = ParsedTraces::default();

    for (trace_index, trace_value) in trace_values.iter().enumerate() {
        let trace_obj = trace_value.as_object().ok_or_else(|| {
            ParseError::InvalidFormat(format!("Trace #{} is not a JSON object", trace_index))
        })?;

        let process = parse_process(trace_obj, trace_index, policy)?;

        let span_values: &[Value] = match trace_obj.get("spans") {
            Some(Value::Array(spans)) => spans.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(ParseError::InvalidFormat(format!(
                    "Trace #{} has non-array spans: {}",
                    trace_index, other
                )))
            }
        };

        let mut spans = Vec::with_capacity(span_values.len());
        for (span_index, span_value) in span_values.iter().enumerate() {
            match parse_span(span_value) {
                Ok(span) => spans.push(span),
                Err(reason) => {
                    let error = MalformedSpanError {
                        trace_index,
                        span_index,
                        reason,
                    };
                    if policy == MalformedPolicy::Strict {
                        return Err(error.into());
                    }
                    warn!("Skipping {}", error);
                    parsed.skipped.push(error);
                }
            }
        }

        parsed.traces.push(Trace::new(process, spans));
    }

    debug!(
        "Parsed {} spans ({} skipped)",
        parsed.span_count(),
        parsed.skipped.len()
    );

    Ok(parsed)
}

/// Parse trace-query JSON from a string
pub fn parse_traces_str(raw: &str, policy: MalformedPolicy) -> Result<ParsedTraces, ParseError> {
    let value: Value = serde_json::from_str(raw)?;
    parse_traces(&value, policy)
}

/// Locate the list of trace objects in the response
///
/// **Private** - internal helper for parse_traces
fn extract_trace_list(raw: &Value) -> Result<Vec<&Value>, ParseError> {
    match raw {
        Value::Array(traces) => Ok(traces.iter().collect()),

        Value::Object(obj) => {
            for field in TRACE_LIST_FIELD_NAMES {
                if let Some(Value::Array(traces)) = obj.get(*field) {
                    debug!("Found trace list under '{}'", field);
                    return Ok(traces.iter().collect());
                }
            }

            if obj.contains_key("spans") {
                debug!("Input is a single trace object");
                return Ok(vec![raw]);
            }

            Err(ParseError::InvalidFormat(
                "Object contains neither a trace list nor spans".to_string(),
            ))
        }

        _ => Err(ParseError::InvalidFormat(
            "Traces must be a JSON array or object".to_string(),
        )),
    }
}

/// Extract the process descriptor of a trace
///
/// **Private** - internal helper for parse_traces
fn parse_process(
    trace_obj: &Map<String, Value>,
    trace_index: usize,
    policy: MalformedPolicy,
) -> Result<Process, ParseError> {
    let problem = match trace_obj.get("process") {
        Some(value @ Value::Object(_)) => match serde_json::from_value(value.clone()) {
            Ok(process) => return Ok(process),
            Err(e) => format!("Trace #{} has invalid process: {}", trace_index, e),
        },
        _ => format!("Trace #{} has no process", trace_index),
    };

    if policy == MalformedPolicy::Strict {
        return Err(ParseError::InvalidFormat(problem));
    }

    warn!("{}, using service '{}'", problem, UNKNOWN_SERVICE);

    let mut process = Process::new(UNKNOWN_SERVICE);
    process.sdk_language = trace_obj
        .get("process")
        .and_then(|p| p.get("sdkLanguage"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(process)
}

/// Parse one span object
///
/// **Public** - exposed for callers that receive spans one at a time
pub fn parse_span(value: &Value) -> Result<Span, MalformedReason> {
    let obj = value.as_object().ok_or(MalformedReason::NotAnObject)?;

    let span_id = first_field(obj, SPAN_ID_FIELD_NAMES)
        .and_then(id_string)
        .ok_or(MalformedReason::MissingSpanId)?;

    let start_value =
        first_field(obj, START_TIME_FIELD_NAMES).ok_or(MalformedReason::MissingStartTime)?;
    let start_time = parse_json_u64(start_value).map_err(|_| MalformedReason::InvalidNumber {
        field: "startTime",
        value: start_value.to_string(),
    })?;

    let duration = match first_field(obj, DURATION_FIELD_NAMES) {
        Some(value) => Some(parse_json_u64(value).map_err(|_| {
            MalformedReason::InvalidNumber {
                field: "duration",
                value: value.to_string(),
            }
        })?),
        None => None,
    };

    let parent_span_id = first_field(obj, PARENT_ID_FIELD_NAMES).and_then(id_string);

    let name = first_field(obj, NAME_FIELD_NAMES)
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(Span {
        span_id,
        parent_span_id,
        name,
        start_time,
        duration,
        tags: obj.get("tags").cloned().unwrap_or(Value::Null),
        events: obj.get("events").cloned().unwrap_or(Value::Null),
        process: None,
    })
}

/// First non-null value among the candidate field names
fn first_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
}

/// Ids may arrive as strings or numbers; empty strings mean "no id"
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Helper to read a u64 from various JSON types (number, string)
///
/// **Private** - internal utility
fn parse_json_u64(val: &Value) -> Result<u64, ParseError> {
    if let Some(n) = val.as_u64() {
        Ok(n)
    } else if let Some(f) = val.as_f64().filter(|f| *f >= 0.0 && f.is_finite()) {
        Ok(f as u64)
    } else if let Some(s) = val.as_str() {
        parse_numeric_value(s)
    } else {
        Err(ParseError::InvalidFormat(format!(
            "Expected non-negative number or string, found {}",
            val
        )))
    }
}

/// Parse a timestamp/duration from hex or decimal string
pub fn parse_numeric_value(value: &str) -> Result<u64, ParseError> {
    let value = value.trim();
    if let Some(hex_str) = value.strip_prefix("0x") {
        u64::from_str_radix(hex_str, 16)
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid hex value: {}", e)))
    } else {
        value
            .parse::<u64>()
            .map_err(|e| ParseError::InvalidFormat(format!("Invalid decimal value: {}", e)))
    }
}

/// Wrap a flame profile and its metrics into the versioned report
///
/// **Public** - used by commands to create final output
pub fn to_report(
    source: impl Into<String>,
    profile: FlameProfile,
    hot_spans: Vec<HotSpan>,
    services: Vec<ServiceTime>,
    skipped: &[MalformedSpanError],
) -> ProfileReport {
    use chrono::Utc;

    ProfileReport {
        version: SCHEMA_VERSION.to_string(),
        source: source.into(),
        profile,
        hot_spans,
        services,
        skipped_spans: skipped.iter().map(ToString::to_string).collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numeric_value() {
        assert_eq!(parse_numeric_value("1000").unwrap(), 1000);
        assert_eq!(parse_numeric_value("0x3e8").unwrap(), 1000);
        assert!(parse_numeric_value("soon").is_err());
    }

    #[test]
    fn test_parse_span_accepts_string_timestamps() {
        let span = parse_span(&json!({
            "spanId": "a",
            "name": "GET /",
            "startTime": "1700000000000000000",
            "duration": 1500
        }))
        .unwrap();

        assert_eq!(span.start_time, 1_700_000_000_000_000_000);
        assert_eq!(span.duration, Some(1500));
        assert_eq!(span.parent_span_id, None);
    }

    #[test]
    fn test_parse_span_empty_parent_is_root() {
        let span = parse_span(&json!({
            "spanId": "a",
            "parentSpanId": "",
            "startTime": 0
        }))
        .unwrap();

        assert!(span.parent_span_id.is_none());
        assert!(span.duration.is_none());
    }

    #[test]
    fn test_parse_span_missing_id() {
        let err = parse_span(&json!({ "startTime": 0 })).unwrap_err();
        assert_eq!(err, MalformedReason::MissingSpanId);
    }

    #[test]
    fn test_parse_span_negative_duration() {
        let err = parse_span(&json!({ "spanId": "a", "startTime": 0, "duration": -5 }))
            .unwrap_err();
        assert!(matches!(
            err,
            MalformedReason::InvalidNumber {
                field: "duration",
                ..
            }
        ));
    }
}
