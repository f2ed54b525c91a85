//! Convert annotated span trees into flamebearer profiles.
//!
//! A flamebearer stores one name table and, per depth level, a flat list
//! of `(offset, total, self, nameIndex)` tuples. Flame-graph widgets read
//! it directly.

use crate::aggregator::tree_builder::SpanNode;
use crate::utils::config::{
    LinsightConfig, DEFAULT_SAMPLE_RATE, DEFAULT_SPY_NAME, DEFAULT_UNITS, FLAMEBEARER_VERSION,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Number of values per sample in a level
pub const SAMPLE_WIDTH: usize = 4;

/// Flame profile consumed by the flame-graph widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlameProfile {
    pub version: u32,
    pub flamebearer: Flamebearer,
    pub metadata: ProfileMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flamebearer {
    pub num_ticks: u64,
    pub max_self: u64,
    pub names: Vec<String>,
    pub levels: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetadata {
    pub format: String,
    pub units: String,
    pub spy_name: String,
    pub sample_rate: u64,
}

/// One decoded level entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub offset: u64,
    pub total: u64,
    pub self_time: u64,
    pub name_index: usize,
}

impl FlameProfile {
    pub fn is_empty(&self) -> bool {
        self.flamebearer.names.is_empty()
    }

    /// Decode the tuples of one level
    pub fn samples(&self, level: usize) -> Vec<Sample> {
        self.flamebearer
            .levels
            .get(level)
            .map(|values| {
                values
                    .chunks_exact(SAMPLE_WIDTH)
                    .map(|chunk| Sample {
                        offset: chunk[0],
                        total: chunk[1],
                        self_time: chunk[2],
                        name_index: chunk[3] as usize,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn name(&self, sample: &Sample) -> Option<&str> {
        self.flamebearer
            .names
            .get(sample.name_index)
            .map(String::as_str)
    }
}

/// Profile metadata settings
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub units: String,
    pub spy_name: String,
    pub sample_rate: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            units: DEFAULT_UNITS.to_string(),
            spy_name: DEFAULT_SPY_NAME.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl ProfileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the `[profile]` section of a config file
    pub fn from_config(config: &LinsightConfig) -> Self {
        let defaults = Self::default();
        Self {
            units: config.profile.units.clone().unwrap_or(defaults.units),
            spy_name: config.profile.spy_name.clone().unwrap_or(defaults.spy_name),
            sample_rate: config.profile.sample_rate.unwrap_or(defaults.sample_rate),
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }
}

/// Convert annotated roots into a flame profile
///
/// **Public** - main entry point for profile conversion
///
/// Pre-order walk; every root starts at level 0, offset 0. A child's
/// offset is its own start time minus the trace start, not an offset
/// accumulated from its parent. `numTicks` is the first root's total.
pub fn convert_to_profile(roots: &[SpanNode], config: &ProfileConfig) -> FlameProfile {
    let mut flamebearer = Flamebearer::default();
    let mut num_ticks = None;

    for root in roots {
        num_ticks.get_or_insert(root.total);
        push_sample(root, 0, 0, &mut flamebearer);
    }

    flamebearer.num_ticks = num_ticks.unwrap_or(0);

    debug!(
        "Converted {} samples across {} levels",
        flamebearer.names.len(),
        flamebearer.levels.len()
    );

    FlameProfile {
        version: FLAMEBEARER_VERSION,
        flamebearer,
        metadata: ProfileMetadata {
            format: "single".to_string(),
            units: config.units.clone(),
            spy_name: config.spy_name.clone(),
            sample_rate: config.sample_rate,
        },
    }
}

/// Append `root` and its descendants in pre-order
fn push_sample(root: &SpanNode, level: usize, offset: u64, out: &mut Flamebearer) {
    let mut stack = vec![(root, level, offset)];

    while let Some((node, level, offset)) = stack.pop() {
        let name_index = out.names.len() as u64;
        out.names.push(node.label());

        if out.levels.len() <= level {
            out.levels.resize_with(level + 1, Vec::new);
        }
        out.levels[level].extend_from_slice(&[offset, node.total, node.self_time, name_index]);
        out.max_self = out.max_self.max(node.self_time);

        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, level + 1, child.offset())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tree_builder::build_trace_tree;
    use crate::parser::schema::{Process, Span, Trace};

    #[test]
    fn test_single_root() {
        let tree = build_trace_tree(&[Trace::new(
            Process::new("svc"),
            vec![Span::new("a", 500).with_name("op").with_duration(100)],
        )]);

        let profile = convert_to_profile(&tree.roots, &ProfileConfig::default());
        assert_eq!(profile.flamebearer.names, vec!["svc:op"]);
        assert_eq!(profile.flamebearer.levels, vec![vec![0, 100, 100, 0]]);
        assert_eq!(profile.flamebearer.num_ticks, 100);
        assert_eq!(profile.flamebearer.max_self, 100);
    }

    #[test]
    fn test_empty_roots() {
        let profile = convert_to_profile(&[], &ProfileConfig::default());
        assert!(profile.is_empty());
        assert_eq!(profile.flamebearer.num_ticks, 0);
        assert!(profile.flamebearer.levels.is_empty());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let profile = convert_to_profile(&[], &ProfileConfig::new().with_units("samples"));
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["flamebearer"]["numTicks"], 0);
        assert_eq!(json["flamebearer"]["maxSelf"], 0);
        assert_eq!(json["metadata"]["format"], "single");
        assert_eq!(json["metadata"]["units"], "samples");
        assert_eq!(json["metadata"]["spyName"], "linsight");
        assert_eq!(json["metadata"]["sampleRate"], 1_000_000_000u64);
    }
}
