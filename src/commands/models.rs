use crate::flamegraph::{FlamegraphConfig, ProfileConfig};
use crate::parser::MalformedPolicy;
use crate::utils::config::{DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;

/// Where traces are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceSource {
    /// Saved trace-query JSON
    File(PathBuf),

    /// Live trace-query endpoint
    Remote { endpoint: String, trace_id: String },
}

impl TraceSource {
    /// Human-readable origin recorded in reports
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Remote { endpoint, trace_id } => format!("{}#{}", endpoint, trace_id),
        }
    }
}

/// Settings shared by every command that loads traces
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub policy: MalformedPolicy,
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            policy: MalformedPolicy::Skip,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Arguments for the profile command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ProfileArgs {
    pub source: TraceSource,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Output path for SVG flamegraph (optional)
    pub output_svg: Option<PathBuf>,

    /// Number of hot spans to include in the report
    pub top_spans: usize,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,

    /// Flame profile metadata
    pub profile_config: ProfileConfig,

    pub load: LoadOptions,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ProfileArgs {
    fn default() -> Self {
        Self {
            source: TraceSource::Remote {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                trace_id: String::new(),
            },
            output_json: PathBuf::from("profile.json"),
            output_svg: None,
            top_spans: 20,
            flamegraph_config: None,
            profile_config: ProfileConfig::default(),
            load: LoadOptions::default(),
            print_summary: false,
        }
    }
}

/// Arguments for the tree command
#[derive(Debug, Clone)]
pub struct TreeArgs {
    pub source: TraceSource,

    pub load: LoadOptions,

    /// Hide rows deeper than this level
    pub max_depth: Option<usize>,
}
