//! Handlers wrapping the client for the plugin's two directions

/// Outbound send with error normalization.
pub mod message;
/// Inbound webhook dispatch.
pub mod webhook;

pub use message::MessageHandler;
pub use webhook::{LoggingListener, WebhookHandler, WebhookListener, WebhookSummary};
