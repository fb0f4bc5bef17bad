//! Graph node labels

use crate::string_utils::{SEPARATOR, last_segment};

/// How a node's graph label is derived from its path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelMode {
    /// Last path segment only. Nodes sharing a final segment collapse
    /// into one graph node.
    #[default]
    LastSegment,
    /// Whole path, with separators replaced by `__`.
    FullPath,
}

impl LabelMode {
    pub fn label(self, path: &str) -> String {
        match self {
            LabelMode::LastSegment => sanitize_label(last_segment(path)),
            LabelMode::FullPath => {
                let path = path.trim_matches(SEPARATOR);
                sanitize_label(&path.replace(SEPARATOR, "__"))
            }
        }
    }
}

/// Make a path segment usable as a graph identifier.
///
/// Hyphens become underscores. Never applied to store or text paths.
pub fn sanitize_label(segment: &str) -> String {
    segment.replace('-', "_")
}
