mod assets;
mod chat;
mod metrics;
mod status;

pub use assets::static_handler;
pub use chat::chat_handler;
pub use metrics::metrics_handler;
pub use status::status_handler;
