use std::sync::Arc;

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::session::Session;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RateLimitStatus {
    pub quota: u32,
    pub remaining: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub credential_configured: bool,
    pub history_entries: usize,
    pub rate_limit: RateLimitStatus,
}

/// Describe the caller's session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> Json<SessionInfo> {
    let limiter = state.gateway.limiter();
    Json(SessionInfo {
        session_id: session.id(),
        created_at: session.created_at(),
        credential_configured: session.credentials.is_set(),
        history_entries: session.history.len(),
        rate_limit: RateLimitStatus {
            quota: limiter.quota(),
            remaining: limiter.remaining(session.caller_key()),
            window_seconds: limiter.window().as_secs(),
        },
    })
}

/// End the session: its credential and history are discarded.
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> StatusCode {
    state.sessions.end(session.id());
    StatusCode::NO_CONTENT
}
