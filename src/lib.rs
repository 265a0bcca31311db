//! Guess the mystery species.
//!
//! A round draws a hidden target species from a taxonomy forest. Every guess
//! reveals the lineage joining the guess and the target through their lowest
//! common ancestor, up to the root. Revealed structure accumulates until the
//! player names the target.
//!
//! ```text
//! guess ─▶ GameSession ─▶ TreeStore (validate) ─▶ LCA ─▶ RevelationEngine
//!                │
//!                └──▶ RoundSnapshot ─▶ listeners / HTTP / terminal
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod render;
pub mod store;
