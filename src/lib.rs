//! vaultviz - crawl a Vault keyspace and render it as a listing or a graph

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod string_utils;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{KeyLister, ListError, VaultClient, VaultClientConfig};
pub use config::{FileConfig, Overrides, Settings};
pub use error::VizError;
pub use output::{
    DotGraph, GraphConfig, GraphSink, LabelMode, OutputConfig, TextFormatter, color_for,
    print_json, print_tree, render_graph, render_store, sanitize_label, write_tree,
};
pub use tree::{CancelToken, CrawlConfig, CrawlError, Crawler, ErrorPolicy, NodeId, SecretNode, SecretStore};
