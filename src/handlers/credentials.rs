use std::sync::Arc;

use axum::{Extension, body::Bytes, extract::State, response::Json};
use serde::Serialize;
use zeroize::Zeroize;

use crate::core::credentials::CredentialSummary;
use crate::core::session::Session;
use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CredentialStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialSummary>,
}

/// Wipe the request buffer when this handler is its only owner.
fn scrub(body: Bytes) {
    if let Ok(mut buf) = body.try_into_mut() {
        buf.as_mut().zeroize();
    }
}

/// Store an uploaded service-account key for this session.
///
/// The raw JSON is the request body. A rejected upload leaves any previous
/// credential in place.
pub async fn upload_credentials(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Arc<Session>>,
    body: Bytes,
) -> AppResult<Json<CredentialStatus>> {
    let result = session.credentials.set(&body);
    scrub(body);

    let credential = match result {
        Ok(credential) => credential,
        Err(err) => {
            tracing::warn!(session = %session.id(), error = %err, "Rejected credential upload");
            return Err(err.into());
        }
    };

    // A replaced key may grant a different voice set
    state.voices.invalidate(&credential).await;

    Ok(Json(CredentialStatus {
        configured: true,
        credential: Some(credential.summary()),
    }))
}

pub async fn get_credentials(
    Extension(session): Extension<Arc<Session>>,
) -> Json<CredentialStatus> {
    let credential = session.credentials.get();
    Json(CredentialStatus {
        configured: credential.is_some(),
        credential: credential.map(|c| c.summary()),
    })
}

pub async fn delete_credentials(
    Extension(session): Extension<Arc<Session>>,
) -> Json<CredentialStatus> {
    if session.credentials.clear() {
        tracing::info!(session = %session.id(), "Service account credential removed");
    }
    Json(CredentialStatus {
        configured: false,
        credential: None,
    })
}
