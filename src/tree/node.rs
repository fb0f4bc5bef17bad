//! Keyspace node types

/// Stable index of a node inside a [`SecretStore`](super::SecretStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One address in the keyspace.
///
/// Nodes are owned by the store. `parent` and `children` are indices into
/// the same store, never owning references. `parent` is written once when
/// the node is registered; `children` only grows, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretNode {
    path: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SecretNode {
    pub(crate) fn new(path: String, parent: Option<NodeId>) -> Self {
        Self {
            path,
            parent,
            children: Vec::new(),
        }
    }

    /// Full normalized path of this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// A leaf is a terminal secret rather than a sub-collection.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Last `/`-separated segment of the path.
    pub fn name(&self) -> &str {
        crate::string_utils::last_segment(&self.path)
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }
}
