use serde::Serialize;
use serde_json::Value;

use crate::error::GatewayError;

// Inbound chat request, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub system: Option<String>,
}

impl ChatRequest {
    /// Parse and validate a `/api/chat` body.
    ///
    /// An empty body is read as `{}`. Anything that is not a JSON object with a
    /// non-blank string `message` is rejected as `MissingMessage`.
    pub fn from_body(body: &[u8]) -> Result<Self, GatewayError> {
        let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Default::default())
        } else {
            serde_json::from_slice(body).map_err(|_| GatewayError::InvalidJson)?
        };

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .ok_or(GatewayError::MissingMessage)?;

        let system = value
            .get("system")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        Ok(Self {
            message: message.to_string(),
            system,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    Echo,
    Relay,
}

// Successful chat response body
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub ok: bool,
    pub mode: ReplyMode,
    pub reply: String,
}

impl ChatReply {
    pub fn new(mode: ReplyMode, reply: String) -> Self {
        Self { ok: true, mode, reply }
    }
}

// GET /api/status body
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub ok: bool,
    pub status: &'static str,
    pub service: &'static str,
    pub uptime_s: u64,
    pub has_key: bool,
    pub model: String,
    pub mode: ReplyMode,
    pub time: String,
}

// Chat-completion API request format
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: [CompletionMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
pub struct CompletionMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Text of the first choice in a chat-completion response.
///
/// Tolerates nulls at any level. Array-of-parts content is joined from its
/// `text` parts. Blank text counts as absent.
pub fn completion_text(response: &Value) -> Option<String> {
    let content = &response["choices"][0]["message"]["content"];

    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}
