use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use super::reveal::RevelationEngine;
use crate::error::{DetailError, GuessError, RoundError};
use crate::models::*;
use crate::store::TreeStore;

const START_MESSAGE: &str = "Guess the mystery species!";

/// Callback invoked with a fresh snapshot after every state change.
pub type StateListener = Box<dyn FnMut(&RoundSnapshot) + Send>;

/// One player's game: owns the round state and drives the revelation engine.
///
/// A session plays any number of rounds on the same tree. Each round draws a
/// target species, accepts guesses until the target is found, and can be
/// restarted at any time with [`start_round`](Self::start_round), which
/// discards everything about the previous round.
pub struct GameSession {
    id: Uuid,
    store: Arc<TreeStore>,
    rng: StdRng,
    status: RoundStatus,
    target: Option<NodeId>,
    /// Stands in for the target's id in everything handed out while masked.
    target_alias: Option<NodeId>,
    guess_history: Vec<NodeId>,
    engine: RevelationEngine,
    message: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    /// Last round start or accepted guess.
    last_active: DateTime<Utc>,
    listeners: Vec<StateListener>,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("target", &self.target)
            .field("guess_history", &self.guess_history)
            .field("engine", &self.engine)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GameSession {
    pub fn new(store: Arc<TreeStore>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// A session whose target draws are reproducible.
    pub fn with_seed(store: Arc<TreeStore>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<TreeStore>, rng: StdRng) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            rng,
            status: RoundStatus::NotStarted,
            target: None,
            target_alias: None,
            guess_history: Vec::new(),
            engine: RevelationEngine::new(),
            message: String::new(),
            started_at: None,
            finished_at: None,
            last_active: Utc::now(),
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn target(&self) -> Option<&Node> {
        self.target
            .as_ref()
            .and_then(|id| self.store.find_by_id(id.as_str()))
    }

    pub fn guess_history(&self) -> &[NodeId] {
        &self.guess_history
    }

    pub fn engine(&self) -> &RevelationEngine {
        &self.engine
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Whether nothing has happened in this session for at least `ttl`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.last_active)
            .to_std()
            .is_ok_and(|idle| idle >= ttl)
    }

    /// Register a listener for state changes.
    pub fn subscribe(&mut self, listener: impl FnMut(&RoundSnapshot) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ============================================================
    // Round lifecycle
    // ============================================================

    /// Start a new round with a target drawn uniformly from all species.
    pub fn start_round(&mut self) -> Result<RoundSnapshot, RoundError> {
        let target = self
            .store
            .species()
            .choose(&mut self.rng)
            .map(|n| n.id.clone());

        match target {
            Some(target) => Ok(self.begin(target)),
            None => {
                self.reset(RoundStatus::NotStarted, None);
                self.message = RoundError::NoSpeciesAvailable.to_string();
                tracing::error!("Cannot start round: tree has no species");
                self.notify();
                Err(RoundError::NoSpeciesAvailable)
            }
        }
    }

    /// Start a new round with a caller-chosen target.
    pub fn start_round_with_target(&mut self, target_id: &str) -> Result<RoundSnapshot, RoundError> {
        match self.store.find_by_id(target_id) {
            Some(node) if node.is_species() => {
                let target = node.id.clone();
                Ok(self.begin(target))
            }
            _ => Err(RoundError::TargetNotSpecies {
                id: target_id.to_string(),
            }),
        }
    }

    fn begin(&mut self, target: NodeId) -> RoundSnapshot {
        tracing::info!(session = %self.id, "Starting round");
        tracing::debug!(session = %self.id, target = %target, "Drew target");
        self.reset(RoundStatus::InProgress, Some(target));
        self.target_alias = Some(NodeId::new(format!("masked-{}", Uuid::new_v4().simple())));
        self.message = START_MESSAGE.to_string();
        self.started_at = Some(Utc::now());
        self.last_active = Utc::now();
        self.notify()
    }

    fn reset(&mut self, status: RoundStatus, target: Option<NodeId>) {
        self.status = status;
        self.target = target;
        self.target_alias = None;
        self.guess_history.clear();
        self.engine.clear();
        self.started_at = None;
        self.finished_at = None;
    }

    // ============================================================
    // Guessing
    // ============================================================

    /// Validate a raw guess and, if it is a new species, reveal its lineage.
    ///
    /// Rejected guesses only update the status message.
    pub fn submit_guess(&mut self, raw: &str) -> Result<GuessOutcome, GuessError> {
        match self.try_guess(raw) {
            Ok(outcome) => {
                self.notify();
                Ok(outcome)
            }
            Err(e) => {
                self.message = e.to_string();
                self.notify();
                Err(e)
            }
        }
    }

    fn try_guess(&mut self, raw: &str) -> Result<GuessOutcome, GuessError> {
        let target = match self.status {
            RoundStatus::NotStarted => return Err(GuessError::RoundNotStarted),
            RoundStatus::Won => return Err(GuessError::RoundOver),
            RoundStatus::InProgress => self.target.clone().ok_or(GuessError::RoundNotStarted)?,
        };

        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(GuessError::EmptyInput);
        }

        let guessed = self
            .store
            .find_by_name(&normalized)
            .filter(|n| n.is_species())
            .ok_or_else(|| GuessError::UnknownOrNotSpecies { input: normalized })?;

        if self.guess_history.contains(&guessed.id) {
            return Err(GuessError::DuplicateGuess {
                name: guessed.name.clone(),
            });
        }

        let guess = GuessRecord {
            id: guessed.id.clone(),
            name: guessed.name.clone(),
        };
        self.guess_history.push(guess.id.clone());
        self.last_active = Utc::now();

        // On a win guess == target, so this single reveal walks the target's
        // whole lineage to the root.
        let disclosure = match self.engine.reveal(&self.store, &guess.id, &target) {
            Ok(disclosure) => Some(disclosure),
            Err(e) => {
                tracing::warn!(session = %self.id, guess = %guess.id, "Guess shares no ancestor with the target");
                tracing::debug!(session = %self.id, "Skipping disclosure: {}", e);
                None
            }
        };

        let guess_count = self.guess_history.len();
        let won = guess.id == target;
        if won {
            self.status = RoundStatus::Won;
            self.finished_at = Some(Utc::now());
            self.message = format!(
                "Congratulations! You guessed \"{}\" in {} guesses!",
                guess.name, guess_count
            );
            tracing::info!(session = %self.id, guesses = guess_count, "Round won");
        } else {
            self.message = format!(
                "\"{}\" is not the one. Keep guessing! ({} guesses so far)",
                guess.name, guess_count
            );
        }

        Ok(GuessOutcome {
            guess,
            won,
            guess_count,
            disclosure: disclosure.map(|d| self.public_disclosure(d)),
        })
    }

    // ============================================================
    // Presentation boundary
    // ============================================================

    /// Detail lookup for a clicked node. Only disclosed nodes may be inspected,
    /// and the target stays hidden while it is masked.
    pub fn node_detail(&self, id: &str) -> Result<NodeDetail, DetailError> {
        if self.target_alias.as_ref().is_some_and(|alias| alias.as_str() == id) {
            return Err(DetailError::NotVisible { id: id.to_string() });
        }
        let node = self
            .store
            .find_by_id(id)
            .ok_or_else(|| DetailError::UnknownNode { id: id.to_string() })?;

        if !self.engine.is_visible(id) || self.is_masked_target(&node.id) {
            return Err(DetailError::NotVisible { id: id.to_string() });
        }
        Ok(NodeDetail::from(node))
    }

    fn is_masked_target(&self, id: &NodeId) -> bool {
        self.status != RoundStatus::Won && self.target.as_ref() == Some(id)
    }

    /// The id a client may see for `id`: the round alias for the masked target,
    /// the real id for everything else.
    fn public_id(&self, id: &NodeId) -> NodeId {
        match &self.target_alias {
            Some(alias) if self.is_masked_target(id) => alias.clone(),
            _ => id.clone(),
        }
    }

    fn public_edge(&self, edge: &Edge) -> Edge {
        Edge::new(self.public_id(&edge.parent), self.public_id(&edge.child))
    }

    fn public_disclosure(&self, disclosure: Disclosure) -> Disclosure {
        Disclosure {
            lca: disclosure.lca.map(|id| self.public_id(&id)),
            nodes: disclosure.nodes.iter().map(|id| self.public_id(id)).collect(),
            edges: disclosure.edges.iter().map(|e| self.public_edge(e)).collect(),
        }
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let target = self.target.as_ref().map(|id| {
            let masked = self.status != RoundStatus::Won;
            TargetView {
                masked,
                id: (!masked || self.engine.is_visible(id.as_str())).then(|| self.public_id(id)),
                name: if masked {
                    None
                } else {
                    self.store.find_by_id(id.as_str()).map(|n| n.name.clone())
                },
            }
        });

        let guesses = self
            .guess_history
            .iter()
            .filter_map(|id| self.store.find_by_id(id.as_str()))
            .map(|n| GuessRecord {
                id: n.id.clone(),
                name: n.name.clone(),
            })
            .collect();

        // Re-sorted after aliasing so the target's position gives nothing away.
        let mut visible_nodes: Vec<VisibleNode> = self
            .engine
            .visible_nodes()
            .iter()
            .filter_map(|id| self.store.find_by_id(id.as_str()))
            .map(|n| self.visible_node(n))
            .collect();
        visible_nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut visible_edges: Vec<Edge> = self
            .engine
            .visible_edges()
            .iter()
            .map(|e| self.public_edge(e))
            .collect();
        visible_edges.sort();

        RoundSnapshot {
            session_id: self.id,
            status: self.status,
            message: self.message.clone(),
            target,
            guesses,
            guess_count: self.guess_history.len(),
            visible_nodes,
            visible_edges,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    fn visible_node(&self, node: &Node) -> VisibleNode {
        let role = if self.target.as_ref() == Some(&node.id) {
            NodeRole::Target
        } else if self.guess_history.contains(&node.id) {
            NodeRole::Guessed
        } else {
            NodeRole::Revealed
        };
        let name = if self.is_masked_target(&node.id) {
            MASKED_NAME.to_string()
        } else {
            node.name.clone()
        };
        VisibleNode {
            id: self.public_id(&node.id),
            name,
            kind: node.kind,
            role,
        }
    }

    fn notify(&mut self) -> RoundSnapshot {
        let snapshot = self.snapshot();
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
        snapshot
    }
}
