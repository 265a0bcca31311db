//! Round state machine: target selection, guess validation and lineage disclosure.

mod reveal;
mod session;

pub use reveal::RevelationEngine;
pub use session::{GameSession, StateListener};
