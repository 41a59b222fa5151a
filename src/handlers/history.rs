use std::sync::Arc;

use axum::{
    Extension,
    extract::Path,
    http::StatusCode,
    response::{Json, Response},
};
use serde::Serialize;
use uuid::Uuid;

use super::speak::audio_response;
use crate::core::history::HistorySummary;
use crate::core::session::Session;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistorySummary>,
}

/// Session history, newest first, without audio.
pub async fn list_history(Extension(session): Extension<Arc<Session>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        entries: session.history.list(),
    })
}

/// Download the audio of one history entry.
pub async fn download_entry(
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let entry = session
        .history
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("history entry {id}")))?;
    Ok(audio_response(entry.audio))
}

pub async fn delete_entry(
    Extension(session): Extension<Arc<Session>>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if session.history.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("history entry {id}")))
    }
}
