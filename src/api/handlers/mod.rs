use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::AppState;
use crate::error::{DetailError, GuessError, RoundError};
use crate::game::GameSession;
use crate::models::*;
use crate::render::render_disclosed;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Per-guess failures are recoverable and go back to the player verbatim.
fn guess_error(e: GuessError) -> ApiError {
    let status = match e {
        GuessError::EmptyInput | GuessError::UnknownOrNotSpecies { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        GuessError::DuplicateGuess { .. } | GuessError::RoundNotStarted | GuessError::RoundOver => {
            StatusCode::CONFLICT
        }
    };
    tracing::warn!("Rejected guess: {}", e);
    (status, e.to_string())
}

fn round_error(e: RoundError) -> ApiError {
    tracing::error!("Cannot start round: {}", e);
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}

fn detail_error(e: DetailError) -> ApiError {
    match e {
        DetailError::UnknownNode { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        DetailError::NotVisible { .. } => (StatusCode::FORBIDDEN, e.to_string()),
    }
}

fn round_not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Round not found".to_string())
}

fn sessions(state: &AppState) -> MutexGuard<'_, HashMap<Uuid, GameSession>> {
    state.sessions.lock().expect("session registry lock poisoned")
}

fn evict_idle(sessions: &mut HashMap<Uuid, GameSession>, ttl: Duration) {
    let now = Utc::now();
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_idle(now, ttl));
    let evicted = before - sessions.len();
    if evicted > 0 {
        tracing::info!(evicted, live = sessions.len(), "Evicted idle sessions");
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tree
// ============================================================

pub async fn list_species(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.species_names())
}

// ============================================================
// Rounds
// ============================================================

pub async fn create_round(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RoundSnapshot>), ApiError> {
    let mut session = GameSession::new(Arc::clone(&state.store));
    let snapshot = session.start_round().map_err(round_error)?;
    let mut sessions = sessions(&state);
    evict_idle(&mut sessions, state.session_ttl);
    sessions.insert(session.id(), session);
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    let sessions = sessions(&state);
    sessions
        .get(&id)
        .map(|s| Json(s.snapshot()))
        .ok_or_else(round_not_found)
}

pub async fn delete_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if sessions(&state).remove(&id).is_some() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(round_not_found())
    }
}

pub async fn restart_round(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, ApiError> {
    let mut sessions = sessions(&state);
    let session = sessions.get_mut(&id).ok_or_else(round_not_found)?;
    session.start_round().map(Json).map_err(round_error)
}

pub async fn submit_guess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SubmitGuessInput>,
) -> Result<Json<GuessResponse>, ApiError> {
    let mut sessions = sessions(&state);
    let session = sessions.get_mut(&id).ok_or_else(round_not_found)?;
    let outcome = session.submit_guess(&input.name).map_err(guess_error)?;
    Ok(Json(GuessResponse {
        outcome,
        snapshot: session.snapshot(),
    }))
}

pub async fn get_node_detail(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(Uuid, String)>,
) -> Result<Json<NodeDetail>, ApiError> {
    let sessions = sessions(&state);
    let session = sessions.get(&id).ok_or_else(round_not_found)?;
    session.node_detail(&node_id).map(Json).map_err(detail_error)
}

pub async fn render_round_tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<String, ApiError> {
    let sessions = sessions(&state);
    sessions
        .get(&id)
        .map(|s| render_disclosed(&s.snapshot()))
        .ok_or_else(round_not_found)
}
