//! Domain models for the mystery tree game.
//!
//! # Core Concepts
//!
//! ## The forest
//!
//! - [`Node`]: A taxonomic unit, either a `family` (grouping) or a `species` (leaf).
//!   Nodes are stored flat and point at their parent.
//! - [`NestedNode`]: The on-disk document shape, where parents embed their children.
//! - [`Edge`]: A directed `(parent, child)` relation, the unit of disclosure.
//!
//! ## A round
//!
//! These exist only for the duration of one round and are cleared on restart:
//!
//! - [`RoundSnapshot`]: Everything the presentation layer may show: visible
//!   nodes and edges, guess history, the (possibly masked) target and a status line.
//! - [`Disclosure`]: What a single guess added to the visible sets.
//! - [`GuessOutcome`]: The result of an accepted guess.

mod node;
mod round;

pub use node::*;
pub use round::*;
