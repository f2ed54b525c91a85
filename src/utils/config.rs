//! Configuration and constants for the CLI.
//!
//! Defaults live in constants; an optional TOML file can override them.
//! Command-line flags override both.

use super::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for trace-query requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default trace-query endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Flamebearer format version
pub const FLAMEBEARER_VERSION: u32 = 1;

/// Span timestamps and durations are nanoseconds
pub const DEFAULT_UNITS: &str = "nanoseconds";
pub const DEFAULT_SPY_NAME: &str = "linsight";
pub const DEFAULT_SAMPLE_RATE: u64 = 1_000_000_000;

/// Service name used when a span has no process attached
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Sample label used when a span has no name
pub const UNNAMED_SPAN: &str = "total";

// Different trace-query responses wrap the trace list under different keys
pub const TRACE_LIST_FIELD_NAMES: &[&str] = &["traces", "data", "result"];

// Span field names (camelCase from the UI API, snake_case / Jaeger-style elsewhere)
pub const SPAN_ID_FIELD_NAMES: &[&str] = &["spanId", "span_id", "spanID"];
pub const PARENT_ID_FIELD_NAMES: &[&str] = &["parentSpanId", "parent_span_id", "parentSpanID"];
pub const START_TIME_FIELD_NAMES: &[&str] = &["startTime", "start_time", "startTimeUnixNano"];
pub const DURATION_FIELD_NAMES: &[&str] = &["duration", "durationNano", "duration_ns"];
pub const NAME_FIELD_NAMES: &[&str] = &["name", "operationName", "operation_name"];

/// Settings loaded from `linsight.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinsightConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub profile: ProfileSettings,

    #[serde(default)]
    pub parser: ParserSettings,
}

/// Trace-query endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default = "default_endpoint_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_endpoint_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Flame profile metadata settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileSettings {
    pub units: Option<String>,
    pub spy_name: Option<String>,
    pub sample_rate: Option<u64>,
}

/// Parser settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParserSettings {
    /// Fail on the first malformed span instead of skipping it
    #[serde(default)]
    pub strict: bool,
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

/// Load configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Read` - If file cannot be read
/// * `ConfigError::Parse` - If TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<LinsightConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading config from: {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let config: LinsightConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LinsightConfig = toml::from_str(
            r#"
            [parser]
            strict = true
            "#,
        )
        .unwrap();

        assert!(config.parser.strict);
        assert_eq!(config.endpoint.url, DEFAULT_ENDPOINT);
        assert_eq!(config.endpoint.timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(config.profile.units.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: LinsightConfig = toml::from_str(
            r#"
            [endpoint]
            url = "https://linsight.example.com"
            timeout_secs = 5

            [profile]
            units = "microseconds"
            sample_rate = 1000000
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.url, "https://linsight.example.com");
        assert_eq!(config.endpoint.timeout_secs, 5);
        assert_eq!(config.profile.units.as_deref(), Some("microseconds"));
        assert_eq!(config.profile.sample_rate, Some(1_000_000));
        assert!(!config.parser.strict);
    }
}
