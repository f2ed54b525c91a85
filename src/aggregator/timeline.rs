//! Flatten span trees into timeline rows.
//!
//! Each row carries its position and width as a percentage of the trace
//! it belongs to, which is what a table-based timeline view draws.

use super::metrics::percentage_of;
use super::tree_builder::SpanNode;
use serde::Serialize;

/// One row of the timeline view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub depth: usize,
    pub span_id: String,
    pub label: String,

    /// Start relative to the trace start, in percent of the trace total
    pub offset_percent: f64,

    /// Total time in percent of the trace total
    pub width_percent: f64,

    pub total: u64,
    pub self_time: u64,
}

/// Flatten roots into pre-order rows
pub fn flatten_timeline(roots: &[SpanNode]) -> Vec<TimelineRow> {
    let mut rows = Vec::new();
    for root in roots {
        root.walk(0, &mut |node, depth| {
            rows.push(TimelineRow {
                depth,
                span_id: node.span_id().to_string(),
                label: node.label(),
                offset_percent: percentage_of(node.offset(), node.trace_total),
                width_percent: percentage_of(node.total, node.trace_total),
                total: node.total,
                self_time: node.self_time,
            })
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tree_builder::build_trace_tree;
    use crate::parser::schema::{Process, Span, Trace};

    #[test]
    fn test_flatten_timeline_percentages() {
        let tree = build_trace_tree(&[Trace::new(
            Process::new("svc"),
            vec![
                Span::new("a", 1_000).with_name("root").with_duration(200),
                Span::new("b", 1_050)
                    .with_parent("a")
                    .with_name("child")
                    .with_duration(100),
            ],
        )]);

        let rows = flatten_timeline(&tree.roots);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[0].offset_percent, 0.0);
        assert_eq!(rows[0].width_percent, 100.0);

        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[1].label, "svc:child");
        assert_eq!(rows[1].offset_percent, 25.0);
        assert_eq!(rows[1].width_percent, 50.0);
    }

    #[test]
    fn test_zero_length_trace() {
        let tree = build_trace_tree(&[Trace::new(
            Process::new("svc"),
            vec![Span::new("a", 5).with_duration(0)],
        )]);

        let rows = flatten_timeline(&tree.roots);
        assert_eq!(rows[0].width_percent, 0.0);
        assert_eq!(rows[0].label, "svc:total");
    }
}
