use linsight_trace::aggregator::build_trace_tree;
use linsight_trace::flamegraph::generator::{get_truncated_name, NodeCategory};
use linsight_trace::flamegraph::{
    convert_to_profile, generate_flamegraph, FlamegraphConfig, ProfileConfig,
};
use linsight_trace::parser::{Process, Span, Trace};
use linsight_trace::utils::FlamegraphError;
use pretty_assertions::assert_eq;

fn checkout_trace() -> Vec<Trace> {
    vec![Trace::new(
        Process::new("checkout"),
        vec![
            Span::new("a", 1_000).with_name("POST /cart").with_duration(100),
            Span::new("b", 1_010)
                .with_parent("a")
                .with_name("SELECT cart")
                .with_duration(30),
            Span::new("c", 1_050)
                .with_parent("a")
                .with_name("publish")
                .with_duration(20),
            Span::new("d", 1_060)
                .with_parent("c")
                .with_name("serialize")
                .with_duration(5),
        ],
    )]
}

#[test]
fn test_single_root_profile() {
    let tree = build_trace_tree(&[Trace::new(
        Process::new("svc"),
        vec![Span::new("a", 0).with_name("op").with_duration(100)],
    )]);

    let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());
    assert_eq!(profile.flamebearer.names, vec!["svc:op".to_string()]);
    assert_eq!(profile.flamebearer.levels[0], vec![0, 100, 100, 0]);
    assert_eq!(profile.flamebearer.num_ticks, 100);
}

#[test]
fn test_unnamed_span_label() {
    let tree = build_trace_tree(&[Trace::new(
        Process::new("svc"),
        vec![Span::new("a", 0).with_duration(100)],
    )]);

    let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());
    assert_eq!(profile.flamebearer.names, vec!["svc:total".to_string()]);
}

#[test]
fn test_child_offsets_derive_from_absolute_start() {
    let tree = build_trace_tree(&checkout_trace());
    let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());

    assert_eq!(
        profile.flamebearer.names,
        vec![
            "checkout:POST /cart",
            "checkout:SELECT cart",
            "checkout:publish",
            "checkout:serialize",
        ]
    );
    assert_eq!(profile.flamebearer.levels.len(), 3);
    assert_eq!(profile.flamebearer.levels[0], vec![0, 100, 50, 0]);
    assert_eq!(
        profile.flamebearer.levels[1],
        vec![10, 30, 30, 1, 50, 20, 15, 2]
    );
    // Offset of the grandchild is relative to the trace, not to its parent
    assert_eq!(profile.flamebearer.levels[2], vec![60, 5, 5, 3]);
    assert_eq!(profile.flamebearer.max_self, 50);

    let samples = profile.samples(1);
    assert_eq!(samples.len(), 2);
    assert_eq!(profile.name(&samples[1]), Some("checkout:publish"));
    assert_eq!(samples[1].self_time, 15);
}

#[test]
fn test_num_ticks_from_first_root() {
    let tree = build_trace_tree(&[Trace::new(
        Process::new("svc"),
        vec![
            Span::new("a", 0).with_name("first").with_duration(10),
            Span::new("b", 0).with_name("second").with_duration(500),
        ],
    )]);

    let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());
    assert_eq!(profile.flamebearer.num_ticks, 10);
    assert_eq!(profile.flamebearer.levels[0], vec![0, 10, 10, 0, 0, 500, 500, 1]);
    assert_eq!(profile.flamebearer.max_self, 500);
}

#[test]
fn test_generate_flamegraph_svg() {
    let tree = build_trace_tree(&checkout_trace());
    let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());

    let config = FlamegraphConfig::new().with_title("Checkout <v2>");
    let svg = generate_flamegraph(&profile, Some(&config)).unwrap();

    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("Checkout &lt;v2&gt;"));
    assert!(svg.contains("checkout:SELECT cart"));
}

#[test]
fn test_generate_flamegraph_empty_profile() {
    let profile = convert_to_profile(&[], &ProfileConfig::default());
    let result = generate_flamegraph(&profile, None);
    assert!(matches!(result, Err(FlamegraphError::EmptyProfile)));
}

#[test]
fn test_node_category() {
    assert_eq!(NodeCategory::from_label("svc:total"), NodeCategory::Root);
    assert_eq!(NodeCategory::from_label("web:GET /users"), NodeCategory::Http);
    assert_eq!(
        NodeCategory::from_label("db:SELECT * FROM users"),
        NodeCategory::Database
    );
    assert_eq!(NodeCategory::from_label("api:redis GET"), NodeCategory::Cache);
    assert_eq!(
        NodeCategory::from_label("worker:kafka.consume"),
        NodeCategory::Messaging
    );
    assert_eq!(NodeCategory::from_label("api:grpc.Check"), NodeCategory::Rpc);
    assert_eq!(NodeCategory::from_label("api:render"), NodeCategory::Internal);
}

#[test]
fn test_get_truncated_name() {
    // Not enough width
    assert_eq!(get_truncated_name("long_function_name", 30.0), None);

    // Exact fit or enough room
    assert_eq!(get_truncated_name("abc", 40.0), Some("abc".to_string()));

    // Truncation needed
    let name = "very_long_span_name_here";
    let truncated = get_truncated_name(name, 50.0).unwrap();
    assert!(truncated.ends_with("..."));
    assert!(truncated.len() < name.len());
}
