//! ASCII tree rendering for the forest and for a round's disclosed subtree.

use std::collections::{BTreeMap, HashSet};

use crate::models::{NestedNode, NodeKind, NodeRole, RoundSnapshot, VisibleNode};

const FAMILY: char = '○';
const SPECIES: char = '•';
const GUESSED: char = '✗';
const TARGET: char = '★';

/// A labelled node ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DisplayNode {
    label: String,
    symbol: char,
    children: Vec<DisplayNode>,
}

fn kind_symbol(kind: NodeKind) -> char {
    match kind {
        NodeKind::Family => FAMILY,
        NodeKind::Species => SPECIES,
    }
}

fn role_symbol(node: &VisibleNode) -> char {
    match node.role {
        NodeRole::Target => TARGET,
        NodeRole::Guessed => GUESSED,
        NodeRole::Revealed => kind_symbol(node.kind),
    }
}

/// Render a whole forest.
///
/// Example output:
/// ```text
/// Animal
/// ├── ○ Mammal
/// │   ├── • Mouse
/// │   └── • Rat
/// └── ○ Bird
///     └── • Eagle
/// ```
pub fn render_forest(nodes: &[NestedNode]) -> String {
    fn convert(node: &NestedNode) -> DisplayNode {
        DisplayNode {
            label: node.name.clone(),
            symbol: kind_symbol(node.kind),
            children: node.children.iter().map(convert).collect(),
        }
    }

    let display: Vec<DisplayNode> = nodes.iter().map(convert).collect();
    render_tree(&display)
}

/// Render only what a round has disclosed.
///
/// Roots are visible nodes with no visible incoming edge; children follow
/// visible edges and are ordered by id. The masked target is drawn as `???`.
/// Everything needed is in the snapshot, so no store lookup happens here.
/// A fresh round renders as an empty string.
///
/// ```text
/// Animal
/// └── ○ Mammal
///     ├── ★ ???
///     └── ✗ Rat
/// ```
pub fn render_disclosed(snapshot: &RoundSnapshot) -> String {
    let by_id: BTreeMap<&str, &VisibleNode> = snapshot
        .visible_nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut has_parent: HashSet<&str> = HashSet::new();
    for edge in &snapshot.visible_edges {
        let (parent, child) = (edge.parent.as_str(), edge.child.as_str());
        if by_id.contains_key(parent) && by_id.contains_key(child) {
            children.entry(parent).or_default().push(child);
            has_parent.insert(child);
        }
    }
    for list in children.values_mut() {
        list.sort_unstable();
    }

    fn build(
        id: &str,
        by_id: &BTreeMap<&str, &VisibleNode>,
        children: &BTreeMap<&str, Vec<&str>>,
    ) -> Option<DisplayNode> {
        let node = by_id.get(id)?;
        Some(DisplayNode {
            label: node.name.clone(),
            symbol: role_symbol(node),
            children: children
                .get(id)
                .map(|kids| {
                    kids.iter()
                        .filter_map(|kid| build(kid, by_id, children))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    let roots: Vec<DisplayNode> = by_id
        .keys()
        .filter(|id| !has_parent.contains(*id))
        .filter_map(|id| build(id, &by_id, &children))
        .collect();
    render_tree(&roots)
}

fn render_tree(nodes: &[DisplayNode]) -> String {
    let mut output = String::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == nodes.len() - 1;
        render_node(&mut output, node, "", is_last, true);
    }
    output
}

/// Recursively render a node and its children.
fn render_node(output: &mut String, node: &DisplayNode, prefix: &str, is_last: bool, is_root: bool) {
    if is_root {
        // Root families print bare; a root species keeps its marker.
        if node.symbol != FAMILY {
            output.push(node.symbol);
            output.push(' ');
        }
        output.push_str(&node.label);
        output.push('\n');
    } else {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(node.symbol);
        output.push(' ');
        output.push_str(&node.label);
        output.push('\n');
    }

    let child_prefix = if is_root {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, false);
    }
}
