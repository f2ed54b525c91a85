use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;
    let profile = &report.profile;

    let malformed_levels = profile
        .flamebearer
        .levels
        .iter()
        .filter(|level| level.len() % crate::flamegraph::profile::SAMPLE_WIDTH != 0)
        .count();
    if malformed_levels > 0 {
        anyhow::bail!(
            "{} flamebearer levels are not made of 4-value samples",
            malformed_levels
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Samples: {}", profile.flamebearer.names.len());
    println!("  Levels: {}", profile.flamebearer.levels.len());
    println!(
        "  Total: {} {}",
        profile.flamebearer.num_ticks, profile.metadata.units
    );
    println!("  Hot Spans: {}", report.hot_spans.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Linsight Trace Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  source: string           - Input file or endpoint#traceId");
        println!("  profile: object          - Flamebearer profile");
        println!("    version: number        - Flamebearer format version");
        println!("    flamebearer.numTicks   - Total of the first root");
        println!("    flamebearer.maxSelf    - Largest self time");
        println!("    flamebearer.names      - \"service:span\" labels");
        println!("    flamebearer.levels     - Per level: [offset, total, self, nameIndex]*");
        println!("    metadata: object       - format, units, spyName, sampleRate");
        println!("  hot_spans: array         - Spans with the most self time");
        println!("  services: array          - Self time per service");
        println!("  skipped_spans: array?    - Malformed spans dropped by the parser");
        println!("  generated_at: string     - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Linsight Trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Span tree reconstruction and flame profiles for Linsight traces.");
}
