use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::state::AppState;

// Everything that is not an API route lands here
pub async fn static_handler(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match state.assets.serve(uri.path()).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(path = uri.path(), error = %e, "static request rejected");
            e.into_response()
        }
    }
}
