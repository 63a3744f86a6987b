use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 25;
pub const DEFAULT_RATE_LIMIT: u32 = 30;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_BODY_BYTES: usize = 128 * 1024;
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer concisely and truthfully.";

// CLI argument structure; every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-gateway")]
#[command(about = "Status, chat relay and static file gateway")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    // Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Directory served for every non-API path
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    // Root document, also the SPA fallback
    #[arg(long, env = "INDEX_FILE", default_value = "index.html")]
    pub index_file: String,

    // Chat-completion API key; echo mode when absent
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    // Upstream timeout in seconds
    #[arg(long, env = "OPENAI_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout: u64,

    // System prompt used when the caller sends none
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    // Value of Access-Control-Allow-Origin
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    // Rate limit max requests per window (0 disables)
    #[arg(long, env = "RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW_SECS", default_value_t = DEFAULT_RATE_WINDOW_SECS)]
    pub rate_window: u64,

    // Largest accepted POST body
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    // Shared bearer token for /api/chat; endpoint is open when absent
    #[arg(long, env = "CHAT_TOKEN", hide_env_values = true)]
    pub chat_token: Option<String>,

    // Serve prometheus metrics on this port when set
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    // Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    /// The API key, unless it is missing or blank.
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    pub fn chat_token(&self) -> Option<&str> {
        non_blank(self.chat_token.as_deref())
    }
}

impl Default for Args {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
            public_dir: PathBuf::from("public"),
            index_file: "index.html".to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            cors_origin: "*".to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: DEFAULT_RATE_WINDOW_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            chat_token: None,
            metrics_port: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
