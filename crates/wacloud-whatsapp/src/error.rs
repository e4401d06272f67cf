//! Error types for wacloud-whatsapp

use thiserror::Error;

/// WhatsApp adapter error type
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential is missing after merging config and environment
    #[error("WhatsApp {field} is required. Set {env_var} environment variable or provide in config.")]
    Configuration {
        /// Human-readable field name
        field: &'static str,
        /// Environment variable that would have supplied it
        env_var: &'static str,
    },

    /// Outbound HTTP call failed (network, non-2xx, undecodable body)
    #[error("transport error: {0}")]
    Transport(String),

    /// Sending a message failed
    #[error("Failed to send WhatsApp message{}", detail(.0))]
    MessageSend(String),

    /// Dispatching an inbound webhook failed
    #[error("Failed to process WhatsApp webhook{}", detail(.0))]
    WebhookProcessing(String),
}

fn detail(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
