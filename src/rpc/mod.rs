//! Client for the Linsight trace-query REST API.

pub mod client;
pub mod types;

// Re-export main types
pub use client::TraceQueryClient;
pub use types::RawTraceData;
