use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::{Edge, NodeId, NodeKind};

/// Label shown in place of the target's name until it is guessed.
pub const MASKED_NAME: &str = "???";

/// Where a game session is in its round lifecycle.
///
/// - `NotStarted`: no target drawn (fresh session, or the last start failed)
/// - `InProgress`: target drawn, guesses accepted
/// - `Won`: the target was guessed; further guesses are rejected
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    NotStarted,
    InProgress,
    Won,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Won => "won",
        }
    }
}

/// How a visible node relates to the current round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// The mystery species.
    Target,
    /// A species the player has guessed.
    Guessed,
    /// Any other disclosed node on a revealed lineage.
    Revealed,
}

/// What the presentation layer may know about the target.
///
/// While `masked`, the name is withheld and the id is only present once the
/// target node itself has been disclosed. Even then it is a round-scoped alias
/// rather than the real id; the same alias appears in `visible_nodes` and
/// `visible_edges`. The real id is shown once the round is won.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetView {
    pub masked: bool,
    pub id: Option<NodeId>,
    pub name: Option<String>,
}

/// A guess as recorded in the round history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuessRecord {
    pub id: NodeId,
    pub name: String,
}

/// A disclosed node with the label the presentation layer should show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibleNode {
    pub id: NodeId,
    /// The node name, or [`MASKED_NAME`] for the masked target.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub role: NodeRole,
}

/// The complete presentation-facing state of a session after a change.
///
/// `visible_nodes` is sorted by id and `visible_edges` by `(parent, child)`,
/// so two snapshots of the same state compare equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub session_id: Uuid,
    pub status: RoundStatus,
    /// Human-readable status line for the player.
    pub message: String,
    /// `None` until a round has started.
    pub target: Option<TargetView>,
    pub guesses: Vec<GuessRecord>,
    pub guess_count: usize,
    pub visible_nodes: Vec<VisibleNode>,
    pub visible_edges: Vec<Edge>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RoundSnapshot {
    pub fn is_visible(&self, id: &str) -> bool {
        self.visible_nodes.iter().any(|n| n.id.as_str() == id)
    }

    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        self.visible_edges
            .iter()
            .any(|e| e.parent.as_str() == parent && e.child.as_str() == child)
    }
}

/// What a single reveal added to the visible sets.
///
/// `nodes` and `edges` only list additions; anything already visible before
/// the reveal is not repeated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disclosure {
    pub lca: Option<NodeId>,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<Edge>,
}

impl Disclosure {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Result of an accepted guess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    pub guess: GuessRecord,
    pub won: bool,
    pub guess_count: usize,
    /// `None` when the lineage could not be resolved and nothing was disclosed.
    pub disclosure: Option<Disclosure>,
}

/// Input for submitting a guess over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitGuessInput {
    pub name: String,
}

/// Response to an accepted guess, including the refreshed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResponse {
    pub outcome: GuessOutcome,
    pub snapshot: RoundSnapshot,
}
