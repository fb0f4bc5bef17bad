//! Output configuration types

use super::graph::GraphConfig;

/// Configuration for output formatting.
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Highlight collections in the text listing
    pub use_color: bool,
    pub graph: GraphConfig,
}
