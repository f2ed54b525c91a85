//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod profile;
pub mod tree;
pub mod utils;

// Re-export main command functions
pub use models::{LoadOptions, ProfileArgs, TraceSource, TreeArgs};
pub use profile::{execute_profile, load_traces, validate_args, validate_source};
pub use tree::{execute_tree, render_timeline};
pub use utils::{display_schema, display_version, validate_report_file};
