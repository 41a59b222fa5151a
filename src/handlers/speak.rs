use std::sync::Arc;

use axum::{
    Extension,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;

use crate::core::session::Session;
use crate::core::tts::SynthesisRequest;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Offers generated audio to browsers as `generated_speech.mp3`.
const AUDIO_DISPOSITION: &str = "attachment; filename=\"generated_speech.mp3\"";
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Header carrying the history entry id of a fresh synthesis.
pub const HISTORY_ID_HEADER: &str = "x-history-id";

/// Build an MP3 download response.
pub fn audio_response(audio: Bytes) -> Response {
    let mut response = (StatusCode::OK, Body::from(audio)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(AUDIO_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(AUDIO_DISPOSITION),
    );
    response
}

/// Synthesize speech for the session.
///
/// Runs the request through the gateway (validation, rate limit, credential,
/// provider) and returns the audio as an MP3 attachment. Successful results
/// are added to the session's history.
pub async fn speak_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    payload: Result<Json<SynthesisRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let audio = state
        .gateway
        .synthesize(session.caller_key(), &session.credentials, &request)
        .await?;

    let entry_id = session.history.push(&request, audio.clone());

    let mut response = audio_response(audio);
    if let Ok(value) = HeaderValue::from_str(&entry_id.to_string()) {
        response.headers_mut().insert(HISTORY_ID_HEADER, value);
    }
    Ok(response)
}
