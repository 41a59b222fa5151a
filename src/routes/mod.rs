pub mod api;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::handlers::api::health_check;
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Public health route plus the session-scoped API, with state applied.
///
/// Outer layers (CORS, per-IP governor, security headers) are added in `main`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let session_routes = api::create_api_router().layer(middleware::from_fn_with_state(
        state.clone(),
        session_middleware,
    ));

    Router::new()
        .route("/", get(health_check))
        .merge(session_routes)
        .with_state(state)
}
