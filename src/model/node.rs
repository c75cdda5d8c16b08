//! The recursive node structure.

use crate::model::metadata::Metadata;
use crate::model::node_id::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Coarse semantic category of a node.
///
/// Only used as a fallback selector when a node's variant is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Space,
    Container,
    Collection,
    Item,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Space => "space",
            NodeType::Container => "container",
            NodeType::Collection => "collection",
            NodeType::Item => "item",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lateral, non-owning reference to another node in the forest.
///
/// Relationships are navigational hints. The renderer never traverses them.
/// Fields default to empty so malformed entries survive parsing and are
/// reported by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "targetId", alias = "target_id", default)]
    pub target_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Relationship {
    pub fn new(target_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            kind: kind.into(),
            meta: None,
        }
    }
}

/// The universal content unit.
///
/// Nodes are immutable snapshots for the duration of a render pass. Children
/// are held behind `Arc` so a re-render can recognise an unchanged subtree by
/// pointer identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Arc<Node>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

impl Node {
    pub fn new(
        id: NodeId,
        node_type: NodeType,
        variant: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            node_type,
            variant: variant.into(),
            title: title.into(),
            metadata: Metadata::default(),
            children: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Parse a node tree from JSON. Does not validate; see [`crate::ingest`].
    pub fn from_json(json: &str) -> Result<Arc<Node>, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children.into_iter().map(Arc::new));
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn into_arc(self) -> Arc<Node> {
        Arc::new(self)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child with the given id.
    pub fn child(&self, id: &NodeId) -> Option<&Arc<Node>> {
        self.children.iter().find(|c| &c.id == id)
    }

    /// Depth-first search for a node in this subtree (including `self`).
    pub fn find(&self, id: &NodeId) -> Option<&Node> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Like [`find`](Self::find) but returns the shared handle of a descendant.
    pub fn find_arc(&self, id: &NodeId) -> Option<&Arc<Node>> {
        for child in &self.children {
            if &child.id == id {
                return Some(child);
            }
            if let Some(found) = child.find_arc(id) {
                return Some(found);
            }
        }
        None
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Ids from `self` down to `id`, inclusive. `None` if unreachable.
    pub fn path_to(&self, id: &NodeId) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        if collect_path(self, id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    /// Parent of `id` within this subtree.
    pub fn parent_of(&self, id: &NodeId) -> Option<&Node> {
        if self.children.iter().any(|c| &c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Pre-order traversal yielding each node with its depth relative to `self`.
    pub fn iter_depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            stack: vec![(self, 0)],
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        self.iter_depth_first().count()
    }
}

fn collect_path(node: &Node, target: &NodeId, path: &mut Vec<NodeId>) -> bool {
    path.push(node.id.clone());
    if &node.id == target {
        return true;
    }
    for child in &node.children {
        if collect_path(child, target, path) {
            return true;
        }
    }
    path.pop();
    false
}

/// Iterator returned by [`Node::iter_depth_first`].
pub struct DepthFirst<'a> {
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        // Reverse so children come out in array order.
        for child in node.children.iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((node, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn sample() -> Node {
        Node::new(id("root"), NodeType::Space, "tab_shell", "Home")
            .with_child(
                Node::new(id("tab-a"), NodeType::Container, "stack", "A").with_child(Node::new(
                    id("g1"),
                    NodeType::Item,
                    "row_simple",
                    "G1",
                )),
            )
            .with_child(Node::new(id("tab-b"), NodeType::Container, "stack", "B"))
    }

    #[test]
    fn parses_wire_format() {
        let json = r#"{
            "id": "n1",
            "type": "item",
            "variant": "row_simple",
            "title": "Buy milk",
            "metadata": {"status": "todo"},
            "relationships": [{"targetId": "n2", "type": "blocks"}]
        }"#;
        let node = Node::from_json(json).unwrap();
        assert_eq!(node.node_type, NodeType::Item);
        assert_eq!(node.metadata.status(), Some("todo"));
        assert_eq!(node.relationships[0].target_id, "n2");
        assert!(node.children.is_empty());
    }

    #[test]
    fn null_metadata_becomes_empty() {
        let json = r#"{"id": "n1", "type": "item", "variant": "x", "title": "t", "metadata": null}"#;
        let node = Node::from_json(json).unwrap();
        assert!(node.metadata.is_empty());
    }

    #[test]
    fn path_to_reaches_grandchild() {
        let root = sample();
        assert_eq!(
            root.path_to(&id("g1")),
            Some(vec![id("root"), id("tab-a"), id("g1")])
        );
        assert_eq!(root.path_to(&id("missing")), None);
    }

    #[test]
    fn parent_of_finds_direct_parent() {
        let root = sample();
        assert_eq!(root.parent_of(&id("g1")).map(|n| n.id.clone()), Some(id("tab-a")));
        assert_eq!(root.parent_of(&id("root")).map(|n| n.id.clone()), None);
    }

    #[test]
    fn depth_first_order_matches_children_order() {
        let root = sample();
        let order: Vec<(String, usize)> = root
            .iter_depth_first()
            .map(|(n, d)| (n.id.to_string(), d))
            .collect();
        assert_eq!(
            order,
            vec![
                ("root".to_string(), 0),
                ("tab-a".to_string(), 1),
                ("g1".to_string(), 2),
                ("tab-b".to_string(), 1),
            ]
        );
    }
}
