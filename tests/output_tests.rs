use linsight_trace::aggregator::{build_trace_tree, calculate_hot_spans, calculate_service_breakdown};
use linsight_trace::flamegraph::{convert_to_profile, ProfileConfig};
use linsight_trace::output::validate_path;
use linsight_trace::output::{read_report, report_to_string, write_report, write_svg};
use linsight_trace::parser::{to_report, Process, ProfileReport, Span, Trace};
use std::path::Path;
use tempfile::NamedTempFile;

fn create_test_report() -> ProfileReport {
    let tree = build_trace_tree(&[Trace::new(
        Process::new("svc"),
        vec![
            Span::new("a", 0).with_name("root").with_duration(100),
            Span::new("b", 10).with_parent("a").with_name("child").with_duration(40),
        ],
    )]);

    to_report(
        "traces.json",
        convert_to_profile(&tree.roots, &ProfileConfig::default()),
        calculate_hot_spans(&tree.roots, 5),
        calculate_service_breakdown(&tree.roots),
        &[],
    )
}

#[test]
fn test_write_and_read_report() {
    let report = create_test_report();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    write_report(&report, path).unwrap();
    let loaded = read_report(path).unwrap();

    assert_eq!(loaded.version, report.version);
    assert_eq!(loaded.source, "traces.json");
    assert_eq!(loaded.profile, report.profile);
    assert_eq!(loaded.hot_spans, report.hot_spans);
}

#[test]
fn test_report_uses_flamebearer_keys() {
    let report = create_test_report();
    let temp_file = NamedTempFile::new().unwrap();
    write_report(&report, temp_file.path()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_file.path()).unwrap()).unwrap();
    assert_eq!(raw["profile"]["flamebearer"]["numTicks"], 100);
    assert_eq!(raw["profile"]["flamebearer"]["names"][1], "svc:child");
    assert_eq!(raw["profile"]["metadata"]["spyName"], "linsight");
    assert!(raw.get("skipped_spans").is_none());
}

#[test]
fn test_report_to_string_matches_written_file() {
    let report = create_test_report();
    let temp_file = NamedTempFile::new().unwrap();
    write_report(&report, temp_file.path()).unwrap();

    let rendered = report_to_string(&report).unwrap();
    assert_eq!(rendered, std::fs::read_to_string(temp_file.path()).unwrap());

    let parsed: ProfileReport = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed.profile, report.profile);
}

#[test]
fn test_validate_output_path_empty() {
    let result = validate_path(Path::new(""));
    assert!(result.is_err());
}

#[test]
fn test_validate_output_path_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let result = validate_path(temp_dir.path());
    assert!(result.is_err());
}

#[test]
fn test_write_creates_parent_dirs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested_path = temp_dir.path().join("nested/dirs/profile.json");

    write_report(&create_test_report(), &nested_path).unwrap();

    assert!(nested_path.exists());
}

#[test]
fn test_svg_write_creates_parent_dirs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested_path = temp_dir.path().join("nested/dirs/flamegraph.svg");
    let valid_svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"></svg>"#;

    write_svg(valid_svg, &nested_path).unwrap();

    assert_eq!(std::fs::read_to_string(&nested_path).unwrap(), valid_svg);
}

#[test]
fn test_read_missing_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(read_report(temp_dir.path().join("missing.json")).is_err());
}
