//! Aggregation of trace data into span trees and metrics.
//!
//! This module transforms parsed traces into:
//! - Annotated span trees (total / self time per node)
//! - Hot span and per-service statistics
//! - Timeline rows for table views

pub mod metrics;
pub mod timeline;
pub mod tree_builder;

// Re-export main types and functions
pub use metrics::{
    calculate_hot_spans, calculate_service_breakdown, calculate_tree_stats, TreeStats,
};
pub use timeline::{flatten_timeline, TimelineRow};
pub use tree_builder::{build_trace_tree, group_spans, SpanNode, TraceTree};
