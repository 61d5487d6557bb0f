//! API route handlers for the agentdeck server.

pub mod health;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/sessions - List all discovered sessions (the polling UI's feed)
/// - GET /api/sessions/{id} - Session detail with description/current-task enrichment
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", sessions::router())
        .with_state(state)
}
