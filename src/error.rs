use thiserror::Error;

use crate::models::NodeId;

/// Errors raised while ingesting a tree document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid tree document: {reason}")]
    InvalidTreeDocument { reason: String },
}

impl TreeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTreeDocument {
            reason: reason.into(),
        }
    }
}

/// Errors that prevent a round from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("No species found in the tree data. Check your JSON!")]
    NoSpeciesAvailable,

    #[error("Node {id} is not a species and cannot be the target")]
    TargetNotSpecies { id: String },
}

/// Per-guess validation failures.
///
/// The `Display` text is the status message shown to the player. None of
/// these mutate session state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuessError {
    #[error("Please enter a species name!")]
    EmptyInput,

    #[error("\"{input}\" is not a valid species in the tree. Try again!")]
    UnknownOrNotSpecies { input: String },

    #[error("You've already guessed \"{name}\". Try a new one!")]
    DuplicateGuess { name: String },

    #[error("No round in progress. Start a new round first!")]
    RoundNotStarted,

    #[error("This round is over. Start a new round to keep playing!")]
    RoundOver,
}

/// Internal inconsistency while disclosing a lineage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevealError {
    #[error("No common ancestor between {guess} and {target}")]
    LcaUnresolvable { guess: NodeId, target: NodeId },
}

/// Failures of the node-detail lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetailError {
    #[error("Node not found: {id}")]
    UnknownNode { id: String },

    #[error("Node {id} has not been revealed")]
    NotVisible { id: String },
}
