// crates/server/src/routes/sessions.rs
//! Session listing and detail endpoints.
//!
//! The dashboard polls GET /api/sessions; every poll is a fresh scan of
//! the storage tree, with the shared cache absorbing the expensive
//! message-content derivations between polls.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use agentdeck_core::{
    discover_sessions, enrich_session_current_task, enrich_session_description, Session,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/sessions - All discovered sessions, most recent first.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<Session>> {
    let mut cache = state.cache.lock().await;
    let sessions = discover_sessions(&state.storage_root, state.thresholds, &mut cache).await;
    Json(sessions)
}

/// GET /api/sessions/{id} - One session with the detail-only enrichment
/// dimensions (description and current task) applied on top.
pub async fn session_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    let mut cache = state.cache.lock().await;
    let sessions = discover_sessions(&state.storage_root, state.thresholds, &mut cache).await;
    let session = sessions
        .into_iter()
        .find(|s| s.id == id)
        .ok_or(ApiError::SessionNotFound(id))?;

    let session = enrich_session_description(&session, &state.storage_root, &mut cache).await;
    let session = enrich_session_current_task(&session, &state.storage_root, &mut cache).await;
    Ok(Json(session))
}

/// Create the session routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(session_detail))
}
