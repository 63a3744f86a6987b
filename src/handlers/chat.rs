use axum::{
    Json,
    extract::{Request, State},
};
use std::sync::Arc;

use crate::body::read_limited;
use crate::error::GatewayError;
use crate::metrics::{CHAT_REQUESTS, RATE_LIMITED};
use crate::middleware::{bearer_token, client_id};
use crate::models::{ChatReply, ChatRequest, ReplyMode};
use crate::relay::echo_reply;
use crate::state::AppState;

// POST /api/chat
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<ChatReply>, GatewayError> {
    CHAT_REQUESTS.inc();

    let client = client_id(&req);
    if !state.rate_limiter.check(&client) {
        RATE_LIMITED.inc();
        tracing::info!(client = %client, "chat request rate limited");
        return Err(GatewayError::RateLimited(state.rate_limiter.window().as_secs()));
    }

    if !state.token_accepted(bearer_token(req.headers())) {
        return Err(GatewayError::Unauthorized);
    }

    let (parts, body) = req.into_parts();
    let bytes = read_limited(&parts.headers, body, state.max_body_bytes).await?;
    let chat = ChatRequest::from_body(&bytes)?;

    let reply = match &state.relay {
        None => ChatReply::new(ReplyMode::Echo, echo_reply(&chat.message)),
        Some(relay) => {
            tracing::debug!(client = %client, model = relay.model(), "relaying chat request");
            ChatReply::new(ReplyMode::Relay, relay.complete(&chat).await?)
        }
    };

    Ok(Json(reply))
}
