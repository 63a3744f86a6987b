//! HTTP gateway: a status endpoint, a chat relay that echoes locally or
//! forwards to an OpenAI-compatible API, and a static file server with
//! single-page-application fallback.

pub mod body;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod relay;
pub mod state;
pub mod static_files;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub use config::Args;
pub use error::GatewayError;
pub use state::AppState;

/// Public router. `/api/status` and `/api/chat` match on exact path and
/// method; every other request goes to the static responder.
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route(
            "/api/status",
            get(handlers::status_handler).fallback(handlers::static_handler),
        )
        .route(
            "/api/chat",
            post(handlers::chat_handler).fallback(handlers::static_handler),
        )
        .fallback(handlers::static_handler);

    apply_gateway_layers(routes, Arc::clone(&state)).with_state(state)
}

/// Wrap `routes` in the cross-cutting layers: panic recovery, CORS and
/// security headers, request tracing.
pub fn apply_gateway_layers(
    routes: Router<Arc<AppState>>,
    state: Arc<AppState>,
) -> Router<Arc<AppState>> {
    routes
        // Inner to the header layer so panic responses still get CORS headers
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::gateway_headers,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Router for the optional metrics listener.
pub fn build_metrics_router() -> Router {
    Router::new().route("/metrics", get(handlers::metrics_handler))
}
