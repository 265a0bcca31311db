mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::game::GameSession;
use crate::store::TreeStore;

/// Shared server state: one read-only tree and the live game sessions.
///
/// Each session sits behind the registry lock, so every guess against a round
/// runs to completion before the next request touches it. Sessions idle for
/// `session_ttl` are dropped when the next round is created.
#[derive(Clone)]
pub struct AppState {
    store: Arc<TreeStore>,
    sessions: Arc<Mutex<HashMap<Uuid, GameSession>>>,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(store: TreeStore, session_ttl: Duration) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            session_ttl,
        }
    }
}

pub fn create_router(store: TreeStore, session_ttl: Duration) -> Router {
    let api = Router::new()
        // Tree
        .route("/species", get(handlers::list_species))
        // Rounds
        .route("/rounds", post(handlers::create_round))
        .route("/rounds/{id}", get(handlers::get_round))
        .route("/rounds/{id}", delete(handlers::delete_round))
        .route("/rounds/{id}/restart", post(handlers::restart_round))
        .route("/rounds/{id}/guesses", post(handlers::submit_guess))
        .route("/rounds/{id}/nodes/{node_id}", get(handlers::get_node_detail))
        .route("/rounds/{id}/tree", get(handlers::render_round_tree))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(store, session_ttl))
}
