use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::error::GatewayError;
use crate::metrics::{RELAY_LATENCY, UPSTREAM_FAILURES};
use crate::models::{ChatRequest, CompletionMessage, CompletionRequest, completion_text};

pub const EMPTY_REPLY: &str = "(empty reply)";

// Local reply used when no API key is configured
pub fn echo_reply(message: &str) -> String {
    format!("Gateway received: \"{message}\"")
}

// Client for an OpenAI-compatible chat-completion endpoint

pub struct RelayClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        timeout: Duration,
    ) -> Self {
        // add https:// if not present
        let base = base_url.trim().trim_end_matches('/');
        let base = if base.starts_with("http") {
            base.to_string()
        } else {
            format!("https://{base}")
        };

        Self {
            client,
            endpoint: format!("{base}/chat/completions"),
            api_key: api_key.to_string(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one completion request. No retries.
    ///
    /// The timeout covers the whole exchange, body included. Dropping the
    /// pending future on expiry closes the outbound connection.
    pub async fn complete(&self, req: &ChatRequest) -> Result<String, GatewayError> {
        let start_time = Instant::now();

        let result = match timeout(self.timeout, self.exchange(req)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::UpstreamTimeout),
        };

        RELAY_LATENCY.observe(start_time.elapsed().as_secs_f64());
        if let Err(e) = &result {
            UPSTREAM_FAILURES.inc();
            tracing::warn!(kind = e.kind(), detail = %e, "relay call failed");
        }
        result
    }

    async fn exchange(&self, req: &ChatRequest) -> Result<String, GatewayError> {
        let system = req.system.as_deref().unwrap_or(&self.system_prompt);
        let payload = CompletionRequest {
            model: &self.model,
            messages: [
                CompletionMessage { role: "system", content: system },
                CompletionMessage { role: "user", content: &req.message },
            ],
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(GatewayError::upstream(upstream_error_detail(status.as_u16(), &body)));
        }

        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::upstream(format!("invalid upstream response: {e}")))?;

        Ok(completion_text(&parsed).unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::UpstreamTimeout
    } else {
        GatewayError::upstream(format!("upstream request failed: {e}"))
    }
}

// Most specific message available: error.message, a string error, the raw body, the status
pub fn upstream_error_detail(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &json["error"];
        let message = error["message"].as_str().or_else(|| error.as_str());
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
    }

    if !body.trim().is_empty() {
        return body.to_string();
    }

    format!("upstream returned status {status}")
}
