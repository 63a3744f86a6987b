use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Upstream details are cut to this many characters before reaching clients.
pub const MAX_DETAIL_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("field 'message' is required")]
    MissingMessage,

    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("too many requests, retry in {0} seconds")]
    RateLimited(u64),

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("bad request path")]
    BadPath,

    #[error("not found")]
    NotFound,

    #[error("upstream did not answer in time")]
    UpstreamTimeout,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Server(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Upstream failure with its detail truncated for client consumption.
    pub fn upstream(detail: impl Into<String>) -> Self {
        GatewayError::Upstream(truncate_detail(&detail.into()))
    }

    /// Stable machine-readable code sent as `error`.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidJson => "invalid_json",
            GatewayError::MissingMessage => "missing_message",
            GatewayError::BodyTooLarge(_) => "body_too_large",
            GatewayError::RateLimited(_) => "rate_limited",
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::BadPath => "bad_path",
            GatewayError::NotFound => "not_found",
            GatewayError::UpstreamTimeout => "upstream_timeout",
            GatewayError::Upstream(_) => "upstream_error",
            GatewayError::Server(_) | GatewayError::Config(_) => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidJson | GatewayError::MissingMessage | GatewayError::BadPath => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::UpstreamTimeout | GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Server(_) | GatewayError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            ok: bool,
            error: &'static str,
            detail: String,
        }

        let status = self.status();
        let body = ErrorBody {
            ok: false,
            error: self.kind(),
            detail: self.to_string(),
        };
        let mut res = (status, Json(body)).into_response();
        let headers = res.headers_mut();

        match self {
            GatewayError::RateLimited(retry) => {
                headers.insert(header::RETRY_AFTER, retry.into());
            }
            GatewayError::Unauthorized => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            // The unread remainder of the body is abandoned with the connection
            GatewayError::BodyTooLarge(_) => {
                headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
            }
            _ => {}
        }

        res
    }
}

/// Cut `detail` to `MAX_DETAIL_CHARS` characters, marking the cut with an ellipsis.
pub fn truncate_detail(detail: &str) -> String {
    let detail = detail.trim();
    match detail.char_indices().nth(MAX_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}...", &detail[..idx]),
        None => detail.to_string(),
    }
}
