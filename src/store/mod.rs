//! In-memory tree store: the canonical forest for a game.

mod convert;
mod lca;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

pub use convert::{flatten, parse_document, unflatten, validate_document};
pub use lca::lowest_common_ancestor;

use crate::error::TreeError;
use crate::models::*;

/// Read-only forest with id, name and children indexes.
///
/// Built once from a document and shared (behind an `Arc`) by every round
/// that plays on it; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct TreeStore {
    nodes: Vec<Node>,
    by_id: HashMap<NodeId, usize>,
    /// Case-folded name -> first node with that name.
    by_name: HashMap<String, usize>,
    children: HashMap<NodeId, Vec<usize>>,
}

impl TreeStore {
    /// Build a store from flat records.
    ///
    /// Rejects duplicate ids and parent cycles. A `parent_id` that does not
    /// resolve is tolerated and the node acts as a root.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, TreeError> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut by_name = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), idx).is_some() {
                return Err(TreeError::invalid(format!("duplicate node id {}", node.id)));
            }
            by_name.entry(node.name.to_lowercase()).or_insert(idx);
        }

        let mut children: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            if let Some(parent) = node.parent_id.as_ref().filter(|p| by_id.contains_key(*p)) {
                children.entry(parent.clone()).or_default().push(idx);
            }
        }

        let store = Self {
            nodes,
            by_id,
            by_name,
            children,
        };
        store.check_acyclic()?;
        Ok(store)
    }

    /// Build a store from an already-deserialized nested document.
    pub fn from_document(nested: &[NestedNode]) -> Result<Self, TreeError> {
        validate_document(nested)?;
        Self::from_nodes(flatten(nested))
    }

    /// Parse, validate and flatten a nested JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, TreeError> {
        let nested = parse_document(json)?;
        Self::from_nodes(flatten(&nested))
    }

    fn check_acyclic(&self) -> Result<(), TreeError> {
        for node in &self.nodes {
            let mut steps = 0;
            let mut current = self.parent_of(node);
            while let Some(ancestor) = current {
                steps += 1;
                if ancestor.id == node.id || steps > self.nodes.len() {
                    return Err(TreeError::invalid(format!(
                        "node {} is its own ancestor",
                        node.id
                    )));
                }
                current = self.parent_of(ancestor);
            }
        }
        Ok(())
    }

    // ============================================================
    // Lookups
    // ============================================================

    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Case-insensitive exact name match. The first node in document order
    /// wins when names collide.
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.nodes[idx])
    }

    pub fn parent_of(&self, node: &Node) -> Option<&Node> {
        node.parent_id
            .as_ref()
            .and_then(|p| self.find_by_id(p.as_str()))
    }

    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.children
            .get(id)
            .map(|idxs| idxs.iter().map(|&idx| &self.nodes[idx]).collect())
            .unwrap_or_default()
    }

    /// Root-first ancestor chain ending at `id`.
    ///
    /// `[id]` for a root, empty when `id` is unknown.
    pub fn path_to_root(&self, id: &str) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.find_by_id(id);
        while let Some(node) = current {
            path.push(node.id.clone());
            current = self.parent_of(node);
        }
        path.reverse();
        path
    }

    pub fn lowest_common_ancestor(&self, a: &str, b: &str) -> Option<NodeId> {
        lowest_common_ancestor(self, a, b)
    }

    // ============================================================
    // Listings
    // ============================================================

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| self.parent_of(n).is_none())
            .collect()
    }

    pub fn species(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_species()).collect()
    }

    /// Sorted species names, for autocomplete.
    pub fn species_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.species().iter().map(|n| n.name.clone()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    pub fn to_nested(&self) -> Vec<NestedNode> {
        unflatten(&self.nodes)
    }
}

/// Load a nested tree document from disk.
pub fn load_tree_file(path: impl AsRef<Path>) -> Result<TreeStore> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree data from {}", path.display()))?;
    let store = TreeStore::from_json_str(&json)?;
    tracing::info!(
        "Loaded {} nodes ({} species) from {}",
        store.len(),
        store.species().len(),
        path.display()
    );
    Ok(store)
}
