//! Directed graph rendering of the keyspace
//!
//! `render_graph` walks the tree depth-first and feeds nodes and edges to
//! a [`GraphSink`]. [`DotGraph`] is the bundled sink; it serializes to
//! Graphviz DOT.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::tree::{NodeId, SecretStore};

use super::color::color_for;
use super::label::LabelMode;

/// Name given to the rendered graph.
pub const GRAPH_NAME: &str = "Vault";

/// Attribute name to literal value. Values are written verbatim.
pub type Attrs = BTreeMap<String, String>;

/// Receiver of graph nodes and edges.
pub trait GraphSink {
    /// Add a node. Adding an id that is already present does nothing.
    fn add_node(&mut self, id: &str, attrs: &Attrs);

    /// Add a directed edge from `from` to `to`.
    fn add_edge(&mut self, from: &str, to: &str);

    /// Text description of the whole graph as collected so far.
    fn to_dot(&self) -> String;
}

/// Options for graph rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphConfig {
    pub label_mode: LabelMode,
    /// Add a `color` attribute chosen by node depth
    pub color_by_depth: bool,
}

impl GraphConfig {
    /// Attributes for a node at `depth` below the root.
    pub fn node_attrs(&self, depth: usize) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("style".to_string(), "\"bold\"".to_string());
        if self.color_by_depth {
            attrs.insert("color".to_string(), color_for(depth).to_string());
        }
        attrs
    }
}

/// Render every descendant of `node` into `graph`.
///
/// For each child, the parent and child nodes are added, then an edge from
/// parent to child, then the child's own subtree with the child's label as
/// the new parent label.
pub fn render_graph<G: GraphSink + ?Sized>(
    graph: &mut G,
    store: &SecretStore,
    node: NodeId,
    parent_label: &str,
    depth: usize,
    config: &GraphConfig,
) {
    for &child in store.children(node) {
        let label = config.label_mode.label(store.node(child).path());
        graph.add_node(parent_label, &config.node_attrs(depth));
        graph.add_node(&label, &config.node_attrs(depth + 1));
        graph.add_edge(parent_label, &label);
        render_graph(graph, store, child, &label, depth + 1, config);
    }
}

/// Render the whole store into a fresh [`DotGraph`].
pub fn render_store(store: &SecretStore, config: &GraphConfig) -> DotGraph {
    let mut graph = DotGraph::new(GRAPH_NAME);
    if let Some(root) = store.root() {
        let root_label = config.label_mode.label(store.node(root).path());
        render_graph(&mut graph, store, root, &root_label, 0, config);
    }
    graph
}

/// In-memory directed graph serializable to DOT.
///
/// Nodes and edges keep insertion order. Both insertions are idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotGraph {
    name: String,
    nodes: Vec<(String, Attrs)>,
    node_index: HashMap<String, usize>,
    edges: Vec<(String, String)>,
    edge_set: HashSet<(String, String)>,
}

impl DotGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(id, _)| id.as_str())
    }

    pub fn node_attrs(&self, id: &str) -> Option<&Attrs> {
        self.node_index.get(id).map(|&i| &self.nodes[i].1)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edge_set.contains(&(from.to_string(), to.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl GraphSink for DotGraph {
    fn add_node(&mut self, id: &str, attrs: &Attrs) {
        if self.node_index.contains_key(id) {
            return;
        }
        self.node_index.insert(id.to_string(), self.nodes.len());
        self.nodes.push((id.to_string(), attrs.clone()));
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let edge = (from.to_string(), to.to_string());
        if self.edge_set.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }

    fn to_dot(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DotGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", dot_id(&self.name))?;
        for (id, attrs) in &self.nodes {
            write!(f, "\t{}", dot_id(id))?;
            if !attrs.is_empty() {
                let list: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, " [ {} ]", list.join(", "))?;
            }
            writeln!(f, ";")?;
        }
        for (from, to) in &self.edges {
            writeln!(f, "\t{}->{};", dot_id(from), dot_id(to))?;
        }
        writeln!(f, "}}")
    }
}

const DOT_KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// Quote `id` unless it is a plain DOT identifier.
fn dot_id(id: &str) -> String {
    let plain = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !DOT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(id));
    if plain {
        id.to_string()
    } else {
        format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
