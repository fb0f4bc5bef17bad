//! Keyspace rendering
//!
//! This module provides renderers for a crawled [`SecretStore`](crate::tree::SecretStore):
//! - Path listing to stdout (optionally colored) or appended to a file
//! - Directed graph in DOT format
//! - JSON
//!
//! # Module Structure
//!
//! - `config` - Output configuration types
//! - `label` - Graph-safe node labels
//! - `color` - Depth palette for graph nodes
//! - `text` - Path listing
//! - `graph` - Graph sink and renderer
//! - `json` - JSON output

mod color;
mod config;
mod graph;
mod json;
mod label;
mod text;

// Re-export public types and functions
pub use color::{PALETTE, color_for};
pub use config::OutputConfig;
pub use graph::{
    Attrs, DotGraph, GRAPH_NAME, GraphConfig, GraphSink, render_graph, render_store,
};
pub use json::{JsonNode, print_json, to_json};
pub use label::{LabelMode, sanitize_label};
pub use text::{TextFormatter, print_tree, write_tree};
