use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{credentials, history, session, speak, voices};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router with session-scoped routes
///
/// Note: the session middleware should be applied after state is available
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/session",
            get(session::get_session).delete(session::end_session),
        )
        .route(
            "/credentials",
            get(credentials::get_credentials)
                .put(credentials::upload_credentials)
                .delete(credentials::delete_credentials),
        )
        .route("/voices", get(voices::list_voices))
        .route("/languages", get(voices::list_languages))
        .route("/speak", post(speak::speak_handler))
        .route("/history", get(history::list_history))
        .route("/history/{id}", delete(history::delete_entry))
        .route("/history/{id}/audio", get(history::download_entry))
        .layer(TraceLayer::new_for_http())
}
