//! Flame profile conversion and rendering.
//!
//! This module converts annotated span trees into flamebearer profiles
//! and renders those profiles as SVG flamegraphs or terminal summaries.

pub mod generator;
pub mod profile;

// Re-export main types
pub use generator::{generate_flamegraph, generate_text_summary, FlamegraphConfig, NodeCategory};
pub use profile::{convert_to_profile, FlameProfile, Flamebearer, ProfileConfig, Sample};
