use axum::http::HeaderValue;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Args;
use crate::error::GatewayError;
use crate::rate_limit::{MAX_WINDOW, RateLimiter};
use crate::relay::RelayClient;
use crate::static_files::StaticFiles;

// app's shared state

pub struct AppState {
    pub started_at: Instant,
    pub rate_limiter: Arc<RateLimiter>,
    pub relay: Option<RelayClient>, // None -> echo mode
    pub model: String,
    pub assets: StaticFiles,
    pub cors_origin: HeaderValue,
    pub max_body_bytes: usize,
    chat_token_digest: Option<[u8; 32]>,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, GatewayError> {
        let cors_origin = HeaderValue::from_str(args.cors_origin.trim()).map_err(|_| {
            GatewayError::Config(format!("invalid CORS origin {:?}", args.cors_origin))
        })?;

        if args.rate_window > MAX_WINDOW.as_secs() {
            return Err(GatewayError::Config(format!(
                "rate window {}s exceeds the maximum of {}s",
                args.rate_window,
                MAX_WINDOW.as_secs()
            )));
        }

        let relay = match args.api_key() {
            Some(key) => {
                let client = reqwest::Client::builder().build().map_err(|e| {
                    GatewayError::Config(format!("failed to build HTTP client: {e}"))
                })?;
                Some(RelayClient::new(
                    client,
                    &args.base_url,
                    key,
                    &args.model,
                    &args.system_prompt,
                    Duration::from_secs(args.upstream_timeout.max(1)),
                ))
            }
            None => None,
        };

        Ok(Self {
            started_at: Instant::now(),
            rate_limiter: Arc::new(RateLimiter::new(
                args.rate_limit,
                Duration::from_secs(args.rate_window.max(1)),
            )),
            relay,
            model: args.model.clone(),
            assets: StaticFiles::new(&args.public_dir, &args.index_file),
            cors_origin,
            max_body_bytes: args.max_body_bytes,
            chat_token_digest: args.chat_token().map(digest),
        })
    }

    pub fn has_key(&self) -> bool {
        self.relay.is_some()
    }

    /// True when no token is configured, or `presented` matches it.
    pub fn token_accepted(&self, presented: Option<&str>) -> bool {
        match (&self.chat_token_digest, presented) {
            (None, _) => true,
            (Some(expected), Some(token)) => digest(token) == *expected,
            (Some(_), None) => false,
        }
    }
}

// Fixed-size digests keep the comparison independent of token length
fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
