//! JSON output formatting

use std::io;

use serde::Serialize;

use crate::tree::{NodeId, SecretStore};

/// Serializable view of a keyspace subtree.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonNode<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub path: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonNode<'a>>,
}

impl<'a> JsonNode<'a> {
    pub fn build(store: &'a SecretStore, id: NodeId) -> Self {
        let node = store.node(id);
        let children: Vec<JsonNode<'a>> = node
            .children()
            .iter()
            .map(|&child| JsonNode::build(store, child))
            .collect();
        Self {
            kind: if node.is_root() || !children.is_empty() {
                "collection"
            } else {
                "secret"
            },
            path: node.path(),
            children,
        }
    }
}

/// Pretty-printed JSON for the whole store, rooted at the base path.
pub fn to_json(store: &SecretStore) -> serde_json::Result<String> {
    match store.root() {
        Some(root) => serde_json::to_string_pretty(&JsonNode::build(store, root)),
        None => Ok("null".to_string()),
    }
}

/// Print the store as pretty-printed JSON to stdout.
pub fn print_json(store: &SecretStore) -> io::Result<()> {
    let json = to_json(store).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::store_from_edges;

    #[test]
    fn test_nested_structure() {
        let store = store_from_edges(
            "secret",
            &[("secret", "secret/app"), ("secret/app", "secret/app/token")],
        );
        let value: serde_json::Value = serde_json::from_str(&to_json(&store).unwrap()).unwrap();

        assert_eq!(value["type"], "collection");
        assert_eq!(value["path"], "secret");
        assert_eq!(value["children"][0]["path"], "secret/app");
        assert_eq!(value["children"][0]["type"], "collection");
        let leaf = &value["children"][0]["children"][0];
        assert_eq!(leaf["path"], "secret/app/token");
        assert_eq!(leaf["type"], "secret");
        assert!(leaf.get("children").is_none());
    }

    #[test]
    fn test_empty_root_is_collection() {
        let store = SecretStore::with_root("secret");
        let value: serde_json::Value = serde_json::from_str(&to_json(&store).unwrap()).unwrap();
        assert_eq!(value["type"], "collection");
    }
}
