use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;

// GET /metrics on the metrics listener
pub async fn metrics_handler() -> Response {
    match crate::metrics::render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => GatewayError::Server(e).into_response(),
    }
}
