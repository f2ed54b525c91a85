//! Profile command implementation.
//!
//! The profile command:
//! 1. Loads traces from a file or the trace-query endpoint
//! 2. Parses them
//! 3. Rebuilds the span tree
//! 4. Converts it to a flame profile
//! 5. Calculates metrics
//! 6. Writes output files

use crate::aggregator::{
    build_trace_tree, calculate_hot_spans, calculate_service_breakdown, calculate_tree_stats,
};
use crate::commands::models::{LoadOptions, ProfileArgs, TraceSource};
use crate::flamegraph::{convert_to_profile, generate_flamegraph, generate_text_summary};
use crate::output::{write_report, write_svg};
use crate::parser::{parse_traces, parse_traces_str, to_report, ParsedTraces, ProfileReport};
use crate::rpc::TraceQueryClient;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the profile command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Trace-query failures
/// * Trace parsing errors (strict mode)
/// * File write errors
pub fn execute_profile(args: ProfileArgs) -> Result<ProfileReport> {
    let start_time = Instant::now();

    info!("Profiling traces from: {}", args.source.describe());

    let parsed = load_traces(&args.source, &args.load)?;
    if !parsed.skipped.is_empty() {
        warn!("{} malformed spans were skipped", parsed.skipped.len());
    }

    info!("Building span tree...");
    let tree = build_trace_tree(&parsed.traces);
    let stats = calculate_tree_stats(&tree);
    info!("Tree: {}", stats.summary());

    if tree.is_empty() {
        warn!("No spans to profile");
    }

    info!("Converting to flame profile...");
    let profile = convert_to_profile(&tree.roots, &args.profile_config);
    debug!(
        "Profile: {} samples, {} ticks",
        profile.flamebearer.names.len(),
        profile.flamebearer.num_ticks
    );

    info!("Calculating top {} hot spans...", args.top_spans);
    let hot_spans = calculate_hot_spans(&tree.roots, args.top_spans);
    let services = calculate_service_breakdown(&tree.roots);

    let svg_content = if args.output_svg.is_some() {
        info!("Generating flamegraph...");
        Some(
            generate_flamegraph(&profile, args.flamegraph_config.as_ref())
                .context("Failed to generate flamegraph")?,
        )
    } else {
        None
    };

    let report = to_report(
        args.source.describe(),
        profile,
        hot_spans,
        services,
        &parsed.skipped,
    );

    write_outputs(&args, &report, svg_content)?;

    if args.print_summary {
        print_profile_summary(&report, stats.summary());
    }

    info!(
        "Profile completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(report)
}

/// Load and parse traces from the given source
///
/// **Public** - shared by the profile and tree commands
pub fn load_traces(source: &TraceSource, options: &LoadOptions) -> Result<ParsedTraces> {
    match source {
        TraceSource::File(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_traces_str(&contents, options.policy)
                .with_context(|| format!("Failed to parse traces in {}", path.display()))
        }
        TraceSource::Remote { endpoint, trace_id } => {
            let client = TraceQueryClient::with_timeout(endpoint.as_str(), options.timeout)
                .context("Failed to create trace-query client")?;
            let raw = client
                .fetch_trace(trace_id)
                .with_context(|| format!("Failed to fetch trace {}", trace_id))?;
            parse_traces(&raw, options.policy).context("Failed to parse trace-query response")
        }
    }
}

/// Write output files (JSON report and optional SVG flamegraph).
///
/// **Private** - internal helper for execute_profile
fn write_outputs(
    args: &ProfileArgs,
    report: &ProfileReport,
    svg_content: Option<String>,
) -> Result<()> {
    info!("Writing output files...");

    write_report(report, &args.output_json).context("Failed to write report JSON")?;
    info!("✓ Report written to: {}", args.output_json.display());

    if let (Some(svg), Some(svg_path)) = (svg_content, &args.output_svg) {
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }

    Ok(())
}

/// Print a human-readable summary to stdout.
///
/// **Private** - internal helper for execute_profile
fn print_profile_summary(report: &ProfileReport, tree_summary: String) {
    let rule = "━".repeat(80);
    println!("\n{}", rule);
    println!("  LINSIGHT TRACE PROFILE SUMMARY");
    println!("{}", rule);
    println!("  Source:     {}", report.source);
    println!("  {}", tree_summary);
    println!(
        "  Total:      {:>12} {}",
        report.profile.flamebearer.num_ticks, report.profile.metadata.units
    );
    println!("  Max self:   {:>12}", report.profile.flamebearer.max_self);
    if !report.skipped_spans.is_empty() {
        println!("  Skipped:    {} malformed spans", report.skipped_spans.len());
    }
    println!();
    println!("  Services:");
    for service in &report.services {
        println!(
            "    {:<30} {:>12} ({} spans)",
            service.service, service.self_time, service.span_count
        );
    }
    println!();
    println!("{}", generate_text_summary(&report.hot_spans, 10));
    println!("{}\n", rule);
}

/// Validate profile arguments
///
/// **Public** - can be called before execute_profile for early validation
pub fn validate_args(args: &ProfileArgs) -> Result<()> {
    validate_source(&args.source)?;

    if args.top_spans == 0 {
        anyhow::bail!("top_spans must be greater than 0");
    }

    if args.top_spans > 1000 {
        anyhow::bail!("top_spans is too large (max 1000)");
    }

    Ok(())
}

/// Validate a trace source
///
/// **Public** - shared by the profile and tree commands
pub fn validate_source(source: &TraceSource) -> Result<()> {
    match source {
        TraceSource::File(path) => {
            if !path.is_file() {
                anyhow::bail!("Input file does not exist: {}", path.display());
            }
        }
        TraceSource::Remote { endpoint, trace_id } => {
            if endpoint.is_empty() {
                anyhow::bail!("Endpoint URL cannot be empty");
            }

            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                anyhow::bail!("Endpoint URL must start with http:// or https://");
            }

            if trace_id.is_empty() {
                anyhow::bail!("Trace id cannot be empty");
            }

            // W3C / Jaeger ids: up to 32 hex characters
            if trace_id.len() > 32 {
                anyhow::bail!("Trace id is too long (max 32 hex characters)");
            }

            if !trace_id.chars().all(|c| c.is_ascii_hexdigit()) {
                anyhow::bail!("Trace id contains invalid characters");
            }
        }
    }

    Ok(())
}
