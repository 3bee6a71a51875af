use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized block tree element.
///
/// Pattern references never survive into a `Node`: `name` is always a
/// concrete block type such as `core/group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Block type identifier, always namespaced (`core/paragraph`).
    pub name: String,
    /// Normalized attribute map.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Child nodes in document order.
    #[serde(rename = "innerBlocks", default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Returns true if the `className` attribute contains `token` as a
    /// whitespace-separated class.
    pub fn has_class(&self, token: &str) -> bool {
        self.attributes
            .get("className")
            .and_then(Value::as_str)
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == token))
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + count_nodes(&self.children)
    }
}

/// Counts every node in `nodes`, recursively.
pub fn count_nodes(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::count).sum()
}
