//! Conversion between the nested document shape and the flat parent-pointer shape.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::TreeError;
use crate::models::{NestedNode, Node, NodeId};

/// Parse and validate a nested tree document.
///
/// The document must be a non-empty JSON array of node objects. Every node at
/// every depth needs a non-blank `id` and `name` and a `type` of `family` or
/// `species`.
pub fn parse_document(json: &str) -> Result<Vec<NestedNode>, TreeError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| TreeError::invalid(format!("not valid JSON: {}", e)))?;

    if !value.is_array() {
        return Err(TreeError::invalid("expected a JSON array of nodes"));
    }

    let nodes: Vec<NestedNode> =
        serde_json::from_value(value).map_err(|e| TreeError::invalid(e.to_string()))?;
    validate_document(&nodes)?;
    Ok(nodes)
}

/// Check the structural requirements `parse_document` enforces on an
/// already-deserialized document.
pub fn validate_document(nodes: &[NestedNode]) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Err(TreeError::invalid("document contains no nodes"));
    }
    validate_entries(nodes)
}

fn validate_entries(nodes: &[NestedNode]) -> Result<(), TreeError> {
    for node in nodes {
        if node.id.trim().is_empty() {
            return Err(TreeError::invalid(format!(
                "node \"{}\" has a blank id",
                node.name
            )));
        }
        if node.name.trim().is_empty() {
            return Err(TreeError::invalid(format!(
                "node {} has a blank name",
                node.id
            )));
        }
        validate_entries(&node.children)?;
    }
    Ok(())
}

/// Flatten nested nodes into parent-pointer records, in pre-order.
///
/// Missing `description` and `imageUrl` become empty strings.
pub fn flatten(nested: &[NestedNode]) -> Vec<Node> {
    let mut flat = Vec::new();
    flatten_into(&mut flat, nested, None);
    flat
}

fn flatten_into(flat: &mut Vec<Node>, nodes: &[NestedNode], parent_id: Option<&NodeId>) {
    for node in nodes {
        let id = NodeId::new(node.id.clone());
        flat.push(Node {
            id: id.clone(),
            name: node.name.clone(),
            description: node.description.clone().unwrap_or_default(),
            image_url: node.image_url.clone().unwrap_or_default(),
            kind: node.kind,
            parent_id: parent_id.cloned(),
        });
        flatten_into(flat, &node.children, Some(&id));
    }
}

/// Rebuild the nested shape from flat records.
///
/// Siblings keep their relative input order. A node whose `parent_id` does not
/// resolve to another record is emitted as a root. Empty metadata strings are
/// omitted.
pub fn unflatten(nodes: &[Node]) -> Vec<NestedNode> {
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let mut children_map: HashMap<Option<&str>, Vec<&Node>> = HashMap::new();
    for node in nodes {
        let parent = node
            .parent_id
            .as_ref()
            .map(NodeId::as_str)
            .filter(|p| known.contains(p));
        children_map.entry(parent).or_default().push(node);
    }

    // Recursively build tree starting from roots (parent = None)
    fn build_subtree(
        parent: Option<&str>,
        children_map: &HashMap<Option<&str>, Vec<&Node>>,
    ) -> Vec<NestedNode> {
        children_map
            .get(&parent)
            .map(|children| {
                children
                    .iter()
                    .map(|n| NestedNode {
                        id: n.id.to_string(),
                        name: n.name.clone(),
                        description: Some(n.description.clone()).filter(|s| !s.is_empty()),
                        image_url: Some(n.image_url.clone()).filter(|s| !s.is_empty()),
                        kind: n.kind,
                        children: build_subtree(Some(n.id.as_str()), children_map),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    build_subtree(None, &children_map)
}
