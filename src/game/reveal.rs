//! Cumulative lineage disclosure.

use std::collections::BTreeSet;

use crate::error::RevealError;
use crate::models::{Disclosure, Edge, NodeId};
use crate::store::TreeStore;

/// Tracks which nodes and edges of the forest the player may see.
///
/// Each reveal adds the lineage joining a guess and the target through their
/// lowest common ancestor, plus the common lineage from that ancestor up to
/// the root. Nothing is ever removed; [`clear`](Self::clear) is the only way
/// back to an empty state and belongs to a round reset.
#[derive(Debug, Clone, Default)]
pub struct RevelationEngine {
    visible_nodes: BTreeSet<NodeId>,
    visible_edges: BTreeSet<Edge>,
}

impl RevelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_nodes(&self) -> &BTreeSet<NodeId> {
        &self.visible_nodes
    }

    pub fn visible_edges(&self) -> &BTreeSet<Edge> {
        &self.visible_edges
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible_nodes.contains(id)
    }

    /// `true` until the first successful reveal of a round.
    pub fn is_fresh(&self) -> bool {
        self.visible_nodes.is_empty() && self.visible_edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.visible_nodes.clear();
        self.visible_edges.clear();
    }

    /// Disclose the lineage connecting `guess` and `target`.
    ///
    /// Fails without touching the visible sets when the two nodes share no
    /// ancestor (unknown id, or nodes in different trees).
    pub fn reveal(
        &mut self,
        store: &TreeStore,
        guess: &NodeId,
        target: &NodeId,
    ) -> Result<Disclosure, RevealError> {
        let lca = store
            .lowest_common_ancestor(guess.as_str(), target.as_str())
            .ok_or_else(|| RevealError::LcaUnresolvable {
                guess: guess.clone(),
                target: target.clone(),
            })?;

        let mut disclosure = Disclosure {
            lca: Some(lca.clone()),
            ..Disclosure::default()
        };

        self.walk_chain(store, guess, Some(&lca), &mut disclosure);
        self.walk_chain(store, target, Some(&lca), &mut disclosure);
        self.walk_chain(store, &lca, None, &mut disclosure);

        // An endpoint equal to the LCA shortens its chain to nothing.
        self.add_node(guess, &mut disclosure);
        self.add_node(target, &mut disclosure);

        tracing::debug!(
            guess = %guess,
            lca = %lca,
            new_nodes = disclosure.nodes.len(),
            new_edges = disclosure.edges.len(),
            "Revealed lineage"
        );
        Ok(disclosure)
    }

    /// Climb from `from` through `parent_id` links, disclosing each node and the
    /// edge to its parent. Stops after `stop` (inclusive, edge above it not
    /// added) or at the root when `stop` is `None`.
    fn walk_chain(
        &mut self,
        store: &TreeStore,
        from: &NodeId,
        stop: Option<&NodeId>,
        disclosure: &mut Disclosure,
    ) {
        let mut current = store.find_by_id(from.as_str());
        while let Some(node) = current {
            self.add_node(&node.id, disclosure);
            if Some(&node.id) == stop {
                break;
            }
            let parent = store.parent_of(node);
            if let Some(parent) = parent {
                self.add_edge(Edge::new(&parent.id, &node.id), disclosure);
            }
            current = parent;
        }
    }

    fn add_node(&mut self, id: &NodeId, disclosure: &mut Disclosure) {
        if self.visible_nodes.insert(id.clone()) {
            disclosure.nodes.push(id.clone());
        }
    }

    fn add_edge(&mut self, edge: Edge, disclosure: &mut Disclosure) {
        if self.visible_edges.insert(edge.clone()) {
            disclosure.edges.push(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, NodeKind};

    fn node(id: &str, kind: NodeKind, parent: Option<&str>) -> Node {
        Node {
            id: NodeId::from(id),
            name: id.to_string(),
            description: String::new(),
            image_url: String::new(),
            kind,
            parent_id: parent.map(NodeId::from),
        }
    }

    // life -> animal -> mammal -> {mouse, rat}; animal -> bird -> eagle
    fn store() -> TreeStore {
        TreeStore::from_nodes(vec![
            node("life", NodeKind::Family, None),
            node("animal", NodeKind::Family, Some("life")),
            node("mammal", NodeKind::Family, Some("animal")),
            node("mouse", NodeKind::Species, Some("mammal")),
            node("rat", NodeKind::Species, Some("mammal")),
            node("bird", NodeKind::Family, Some("animal")),
            node("eagle", NodeKind::Species, Some("bird")),
            node("island", NodeKind::Family, None),
            node("dodo", NodeKind::Species, Some("island")),
        ])
        .unwrap()
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_fresh_engine_is_empty() {
        let engine = RevelationEngine::new();
        assert!(engine.is_fresh());
        assert!(!engine.is_visible("mouse"));
    }

    #[test]
    fn test_reveal_siblings_discloses_both_branches_and_root_lineage() {
        let store = store();
        let mut engine = RevelationEngine::new();

        let disclosure = engine.reveal(&store, &id("rat"), &id("mouse")).unwrap();

        assert_eq!(disclosure.lca, Some(id("mammal")));
        for visible in ["rat", "mouse", "mammal", "animal", "life"] {
            assert!(engine.is_visible(visible), "{} should be visible", visible);
        }
        assert!(!engine.is_visible("bird"));
        assert!(engine.visible_edges().contains(&Edge::new("mammal", "rat")));
        assert!(engine.visible_edges().contains(&Edge::new("mammal", "mouse")));
        assert!(engine.visible_edges().contains(&Edge::new("animal", "mammal")));
        assert!(engine.visible_edges().contains(&Edge::new("life", "animal")));
        assert_eq!(engine.visible_edges().len(), 4);
    }

    #[test]
    fn test_reveal_is_cumulative() {
        let store = store();
        let mut engine = RevelationEngine::new();

        engine.reveal(&store, &id("rat"), &id("mouse")).unwrap();
        let disclosure = engine.reveal(&store, &id("eagle"), &id("mouse")).unwrap();

        assert_eq!(disclosure.lca, Some(id("animal")));
        assert_eq!(disclosure.nodes, vec![id("eagle"), id("bird")]);
        assert_eq!(
            disclosure.edges,
            vec![Edge::new("bird", "eagle"), Edge::new("animal", "bird")]
        );
        assert!(engine.is_visible("rat"));
    }

    #[test]
    fn test_reveal_target_against_itself_discloses_full_lineage() {
        let store = store();
        let mut engine = RevelationEngine::new();

        let disclosure = engine.reveal(&store, &id("mouse"), &id("mouse")).unwrap();

        assert_eq!(disclosure.lca, Some(id("mouse")));
        assert_eq!(
            engine.visible_nodes().iter().cloned().collect::<Vec<_>>(),
            vec![id("animal"), id("life"), id("mammal"), id("mouse")]
        );
        assert_eq!(engine.visible_edges().len(), 3);
    }

    #[test]
    fn test_repeated_reveal_adds_nothing() {
        let store = store();
        let mut engine = RevelationEngine::new();

        engine.reveal(&store, &id("rat"), &id("mouse")).unwrap();
        let again = engine.reveal(&store, &id("rat"), &id("mouse")).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_unresolvable_lca_leaves_state_untouched() {
        let store = store();
        let mut engine = RevelationEngine::new();
        engine.reveal(&store, &id("rat"), &id("mouse")).unwrap();
        let before = engine.visible_nodes().clone();

        let err = engine.reveal(&store, &id("dodo"), &id("mouse")).unwrap_err();

        assert_eq!(
            err,
            RevealError::LcaUnresolvable {
                guess: id("dodo"),
                target: id("mouse"),
            }
        );
        assert_eq!(engine.visible_nodes(), &before);
    }

    #[test]
    fn test_clear_returns_to_fresh() {
        let store = store();
        let mut engine = RevelationEngine::new();
        engine.reveal(&store, &id("eagle"), &id("mouse")).unwrap();
        engine.clear();
        assert!(engine.is_fresh());
    }
}
