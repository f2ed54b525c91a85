//! Linsight Trace
//!
//! Span tree reconstruction and flame profile generation for traces
//! returned by the Linsight trace-query API.
//!
//! ## Getting Started
//!
//! ```ignore
//! use linsight_trace::aggregator::build_trace_tree;
//! use linsight_trace::flamegraph::{convert_to_profile, ProfileConfig};
//! use linsight_trace::parser::{parse_traces_str, MalformedPolicy};
//!
//! let parsed = parse_traces_str(&json, MalformedPolicy::Skip)?;
//! let tree = build_trace_tree(&parsed.traces);
//! let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());
//! ```
//!
//! The `linsight-trace` binary wraps this in a CLI (`linsight-trace --help`).

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod rpc;
pub mod utils;
