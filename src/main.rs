//! Linsight Trace CLI
//!
//! Rebuilds span trees from Linsight trace-query results and turns them
//! into flame profiles, SVG flamegraphs and timeline views.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use linsight_trace::commands::{
    display_schema, display_version, execute_profile, execute_tree, validate_args,
    validate_report_file, validate_source, LoadOptions, ProfileArgs, TraceSource, TreeArgs,
};
use linsight_trace::flamegraph::{FlamegraphConfig, ProfileConfig};
use linsight_trace::parser::MalformedPolicy;
use linsight_trace::utils::config::{load_config, LinsightConfig};

/// Linsight Trace - span trees and flame profiles for Linsight traces
#[derive(Parser, Debug)]
#[command(name = "linsight-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a linsight.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Where to read traces from
#[derive(Args, Debug)]
struct SourceArgs {
    /// Saved trace-query JSON file
    #[arg(short, long, conflicts_with = "trace_id", required_unless_present = "trace_id")]
    input: Option<PathBuf>,

    /// Trace id to fetch from the trace-query endpoint
    #[arg(short, long)]
    trace_id: Option<String>,

    /// Trace-query endpoint URL
    #[arg(short, long, env = "LINSIGHT_ENDPOINT")]
    endpoint: Option<String>,

    /// Fail on the first malformed span instead of skipping it
    #[arg(long)]
    strict: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a flame profile from traces
    Profile {
        #[command(flatten)]
        source: SourceArgs,

        /// Output path for the JSON report (placed in artifacts/ by default)
        #[arg(short, long, default_value = "artifacts/profile.json")]
        output: PathBuf,

        /// Output path for SVG flamegraph (placed in artifacts/ by default)
        #[arg(short, long, default_missing_value = "artifacts/flamegraph.svg", num_args = 0..=1)]
        flamegraph: Option<PathBuf>,

        /// Number of hot spans to include
        #[arg(long, default_value = "20")]
        top_spans: usize,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value = "1200")]
        width: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Print the span tree as a timeline
    Tree {
        #[command(flatten)]
        source: SourceArgs,

        /// Hide spans deeper than this level
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LinsightConfig::default(),
    };

    // Execute command
    match cli.command {
        Commands::Profile {
            source,
            mut output,
            mut flamegraph,
            top_spans,
            title,
            width,
            summary,
        } => {
            // Ensure outputs go to artifacts/ if no directory is specified
            let artifacts_dir = PathBuf::from("artifacts");

            if output.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
                output = artifacts_dir.join(output);
            }

            if let Some(ref mut fg) = flamegraph {
                if fg.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
                    *fg = artifacts_dir.join(&fg);
                }
            }

            // Create flamegraph config
            let fg_config = flamegraph.as_ref().map(|_| {
                let config = FlamegraphConfig::new().with_width(width);
                match title {
                    Some(title_str) => config.with_title(title_str),
                    None => config,
                }
            });

            let load = load_options(&source, &config);
            let args = ProfileArgs {
                source: trace_source(source, &config),
                output_json: output,
                output_svg: flamegraph,
                top_spans,
                flamegraph_config: fg_config,
                profile_config: ProfileConfig::from_config(&config),
                load,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_profile(args)?;
        }

        Commands::Tree { source, max_depth } => {
            let load = load_options(&source, &config);
            let args = TreeArgs {
                source: trace_source(source, &config),
                load,
                max_depth,
            };

            validate_source(&args.source)?;
            execute_tree(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Resolve the trace source; CLI flags win over the config file
fn trace_source(args: SourceArgs, config: &LinsightConfig) -> TraceSource {
    match (args.input, args.trace_id) {
        (Some(path), _) => TraceSource::File(path),
        (None, trace_id) => TraceSource::Remote {
            endpoint: args
                .endpoint
                .unwrap_or_else(|| config.endpoint.url.clone()),
            trace_id: trace_id.unwrap_or_default(),
        },
    }
}

fn load_options(args: &SourceArgs, config: &LinsightConfig) -> LoadOptions {
    LoadOptions {
        policy: if args.strict || config.parser.strict {
            MalformedPolicy::Strict
        } else {
            MalformedPolicy::Skip
        },
        timeout: config.endpoint.timeout(),
    }
}
