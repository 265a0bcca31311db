use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque node identifier taken verbatim from the tree document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A taxonomic unit in the forest.
///
/// Nodes are stored flat: the hierarchy lives entirely in `parent_id`, which
/// is a back reference used for upward traversal. `Family` nodes group other
/// nodes; `Species` nodes are the leaves players guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// `None` for a root.
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn is_species(&self) -> bool {
        self.kind == NodeKind::Species
    }
}

/// The two node types of the taxonomy.
///
/// - `Family`: an internal grouping node
/// - `Species`: a leaf, the only kind that can be guessed or drawn as target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Family,
    Species,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Species => "species",
        }
    }
}

/// A node with its nested children, the shape of the tree document on disk.
///
/// `description` and `imageUrl` may be omitted and default to empty strings
/// once flattened. `children` is omitted from the JSON when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedNode>,
}

/// A disclosed parent-child relation.
///
/// Direction matters: `(parent, child)` and `(child, parent)` are different
/// edges, and only the former is ever produced by walking `parent_id` links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
}

impl Edge {
    pub fn new(parent: impl Into<NodeId>, child: impl Into<NodeId>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

/// Display metadata for a single node, returned by detail lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub id: NodeId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl From<&Node> for NodeDetail {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            image_url: node.image_url.clone(),
            kind: node.kind,
        }
    }
}
