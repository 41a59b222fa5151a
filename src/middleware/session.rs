use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::core::session::Session;
use crate::state::AppState;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

/// Session middleware
///
/// Resolves the `x-session-id` request header to a live session, or starts a
/// new one when the header is absent, malformed or unknown. The session is
/// inserted into request extensions for handlers and, while it is still live,
/// its id is echoed in the response header so the client can keep using it.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(&SESSION_HEADER)
        .and_then(|value| value.to_str().ok());
    let (session, created) = state.sessions.resolve(presented);

    if created {
        tracing::debug!(
            session = %session.id(),
            path = %request.uri().path(),
            "Issued new session"
        );
    }

    let session_id = session.id();
    request.extensions_mut().insert::<Arc<Session>>(session);

    let mut response = next.run(request).await;
    // An ended session is not handed back; the next request starts a new one
    if !state.sessions.contains(session_id) {
        return response;
    }
    if let Ok(value) = HeaderValue::from_str(&session_id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
