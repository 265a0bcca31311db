//! Lowest common ancestor by root-path intersection.

use super::TreeStore;
use crate::models::NodeId;

/// Find the deepest node that is an ancestor of both `a` and `b`.
///
/// Both root-first paths are walked in lockstep; the answer is the last id on
/// which they agree. A node is its own ancestor, so `lca(a, a) == a` and the
/// LCA of a node and one of its ancestors is that ancestor. Returns `None` if
/// either id is unknown or the two nodes live in different trees.
pub fn lowest_common_ancestor(store: &TreeStore, a: &str, b: &str) -> Option<NodeId> {
    let path_a = store.path_to_root(a);
    let path_b = store.path_to_root(b);

    path_a
        .iter()
        .zip(path_b.iter())
        .take_while(|(x, y)| x == y)
        .last()
        .map(|(id, _)| id.clone())
}
