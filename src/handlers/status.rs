use axum::{Json, extract::State};
use std::sync::Arc;

use crate::models::{ReplyMode, StatusReport};
use crate::state::AppState;

pub const SERVICE_NAME: &str = "chat-gateway";

// GET|HEAD /api/status - never fails
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    let mode = if state.has_key() {
        ReplyMode::Relay
    } else {
        ReplyMode::Echo
    };

    Json(StatusReport {
        ok: true,
        status: "ok",
        service: SERVICE_NAME,
        uptime_s: state.started_at.elapsed().as_secs(),
        has_key: state.has_key(),
        model: state.model.clone(),
        mode,
        time: chrono::Utc::now().to_rfc3339(),
    })
}
