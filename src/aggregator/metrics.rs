//! Calculate performance metrics from annotated span trees.
//!
//! Hot spans are the spans with the most self time.
//! These are the primary targets for optimization.

use super::tree_builder::{SpanNode, TraceTree};
use crate::parser::schema::{HotSpan, ServiceTime};
use crate::utils::config::UNKNOWN_SERVICE;
use log::debug;
use std::collections::HashMap;

/// Rank spans by self time
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `roots` - Annotated roots from build_trace_tree
/// * `top_n` - Number of spans to return
///
/// # Returns
/// Hot spans sorted by self time (descending), ties keep tree order
pub fn calculate_hot_spans(roots: &[SpanNode], top_n: usize) -> Vec<HotSpan> {
    let mut nodes: Vec<&SpanNode> = Vec::new();
    for root in roots {
        root.walk(0, &mut |node, _| nodes.push(node));
    }
    debug!("Ranking {} spans by self time", nodes.len());

    nodes.sort_by(|a, b| b.self_time.cmp(&a.self_time));
    nodes
        .into_iter()
        .take(top_n)
        .map(create_hot_span)
        .collect()
}

/// Create a HotSpan from a tree node
///
/// **Public** - exposed for tests and custom rankings
pub fn create_hot_span(node: &SpanNode) -> HotSpan {
    HotSpan {
        label: node.label(),
        span_id: node.span_id().to_string(),
        self_time: node.self_time,
        total: node.total,
        percentage: percentage_of(node.self_time, node.trace_total),
    }
}

/// Sum self time per service
///
/// **Public** - per-process breakdown for reports
pub fn calculate_service_breakdown(roots: &[SpanNode]) -> Vec<ServiceTime> {
    let mut by_service: HashMap<String, ServiceTime> = HashMap::new();

    for root in roots {
        root.walk(0, &mut |node, _| {
            let service = node.span.service_name().unwrap_or(UNKNOWN_SERVICE);
            let entry = by_service
                .entry(service.to_string())
                .or_insert_with(|| ServiceTime {
                    service: service.to_string(),
                    self_time: 0,
                    span_count: 0,
                });
            entry.self_time = entry.self_time.saturating_add(node.self_time);
            entry.span_count += 1;
        });
    }

    let mut services: Vec<ServiceTime> = by_service.into_values().collect();
    services.sort_by(|a, b| {
        b.self_time
            .cmp(&a.self_time)
            .then_with(|| a.service.cmp(&b.service))
    });
    services
}

/// Shape statistics of a trace tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    pub root_count: usize,

    /// Nodes reachable from roots (merged siblings count once)
    pub node_count: usize,

    /// Spans known to the id map
    pub span_count: usize,

    /// Deepest level, roots are level 0
    pub max_depth: usize,

    /// Sum of root totals
    pub total_time: u64,
}

impl TreeStats {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Roots: {} | Nodes: {} | Spans: {} | Depth: {} | Total: {} ns",
            self.root_count, self.node_count, self.span_count, self.max_depth, self.total_time
        )
    }
}

/// Calculate shape statistics
pub fn calculate_tree_stats(tree: &TraceTree) -> TreeStats {
    let mut stats = TreeStats {
        root_count: tree.roots.len(),
        span_count: tree.spans.len(),
        ..Default::default()
    };

    for root in &tree.roots {
        stats.total_time = stats.total_time.saturating_add(root.total);
        root.walk(0, &mut |_, depth| {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(depth);
        });
    }

    stats
}

pub(crate) fn percentage_of(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tree_builder::build_trace_tree;
    use crate::parser::schema::{Process, Span, Trace};

    fn sample_tree() -> TraceTree {
        build_trace_tree(&[
            Trace::new(
                Process::new("frontend"),
                vec![
                    Span::new("a", 0).with_name("GET /").with_duration(100),
                    Span::new("b", 10)
                        .with_parent("a")
                        .with_name("render")
                        .with_duration(20),
                ],
            ),
            Trace::new(
                Process::new("api"),
                vec![Span::new("c", 40)
                    .with_parent("a")
                    .with_name("query")
                    .with_duration(50)],
            ),
        ])
    }

    #[test]
    fn test_calculate_hot_spans() {
        let tree = sample_tree();
        let hot = calculate_hot_spans(&tree.roots, 2);

        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].label, "api:query");
        assert_eq!(hot[0].self_time, 50);
        assert_eq!(hot[0].percentage, 50.0);
        assert_eq!(hot[1].label, "frontend:GET /");
        assert_eq!(hot[1].self_time, 30);
    }

    #[test]
    fn test_service_breakdown() {
        let tree = sample_tree();
        let services = calculate_service_breakdown(&tree.roots);

        // Equal self time, ordered by name
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].service, "api");
        assert_eq!(services[0].self_time, 50);
        assert_eq!(services[0].span_count, 1);
        assert_eq!(services[1].service, "frontend");
        assert_eq!(services[1].self_time, 50);
        assert_eq!(services[1].span_count, 2);
    }

    #[test]
    fn test_tree_stats() {
        let stats = calculate_tree_stats(&sample_tree());
        assert_eq!(stats.root_count, 1);
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.span_count, 3);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.total_time, 100);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(percentage_of(10, 0), 0.0);
    }
}
