use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::core::gateway::GatewayError;
use crate::core::session::Session;
use crate::core::tts::{DEFAULT_LANGUAGE, DEFAULT_VOICE};
use crate::core::voices::{LanguageOption, VoiceOption};
use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoicesQuery {
    /// Restrict the list to one language code, e.g. `en-US`
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceOption>,
    pub default_voice: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageOption>,
    pub default_language: &'static str,
}

/// List voices available to the session's credential.
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    Query(query): Query<VoicesQuery>,
) -> AppResult<Json<VoicesResponse>> {
    let credential = session
        .credentials
        .get()
        .ok_or(GatewayError::NoCredential)?;
    let language = query.language.as_deref().filter(|l| !l.trim().is_empty());

    let voices = state
        .voices
        .voice_options(state.gateway.provider(), &credential, language)
        .await?;

    Ok(Json(VoicesResponse {
        voices,
        default_voice: DEFAULT_VOICE,
    }))
}

/// List languages that have at least one voice, with display names.
pub async fn list_languages(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
) -> AppResult<Json<LanguagesResponse>> {
    let credential = session
        .credentials
        .get()
        .ok_or(GatewayError::NoCredential)?;

    let languages = state
        .voices
        .languages(state.gateway.provider(), &credential)
        .await?;

    Ok(Json(LanguagesResponse {
        languages,
        default_language: DEFAULT_LANGUAGE,
    }))
}
