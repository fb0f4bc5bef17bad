//! SecretStore - arena of keyspace nodes addressed by id and by path

use std::collections::HashMap;

use super::node::{NodeId, SecretNode};

/// Outcome of registering a path in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new node was created and appended to its parent.
    Created(NodeId),
    /// The path was already known; the existing node is left untouched.
    Existing(NodeId),
}

impl Registration {
    pub fn id(self) -> NodeId {
        match self {
            Registration::Created(id) | Registration::Existing(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

/// Sole owner of every discovered node.
///
/// Nodes live in a flat arena; relations are [`NodeId`] indices. The path
/// index guarantees that no two nodes share a path.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    nodes: Vec<SecretNode>,
    index: HashMap<String, NodeId>,
    root: Option<NodeId>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a root node for `path`.
    pub fn with_root(path: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.seed_root(path);
        store
    }

    /// Seed the root node. Any previous content is discarded, so the
    /// same store can be re-crawled from scratch.
    pub fn seed_root(&mut self, path: impl Into<String>) -> NodeId {
        self.clear();
        let path = path.into();
        let id = NodeId(0);
        self.index.insert(path.clone(), id);
        self.nodes.push(SecretNode::new(path, None));
        self.root = Some(id);
        id
    }

    /// Register `path` as the next child of `parent`.
    ///
    /// Returns [`Registration::Existing`] without modifying anything when
    /// the path is already present.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not handed out by this store.
    pub fn register(&mut self, parent: NodeId, path: impl Into<String>) -> Registration {
        let path = path.into();
        if let Some(&existing) = self.index.get(&path) {
            return Registration::Existing(existing);
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(SecretNode::new(path.clone(), Some(parent)));
        self.index.insert(path, id);
        self.nodes[parent.0].push_child(id);
        Registration::Created(id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.root = None;
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&SecretNode> {
        self.nodes.get(id.0)
    }

    /// Panicking accessor for ids handed out by this store.
    pub fn node(&self, id: NodeId) -> &SecretNode {
        &self.nodes[id.0]
    }

    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SecretNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }

    /// Paths of every descendant of the root, depth-first pre-order.
    pub fn descendant_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        if let Some(root) = self.root {
            self.collect_paths(root, &mut paths);
        }
        paths
    }

    fn collect_paths<'a>(&'a self, id: NodeId, out: &mut Vec<&'a str>) {
        for &child in self.children(id) {
            out.push(self.node(child).path());
            self.collect_paths(child, out);
        }
    }
}
