//! wacloud WhatsApp - WhatsApp Cloud API adapter
//!
//! This crate exposes WhatsApp Cloud API send/receive to a host agent runtime:
//! - Config: explicit values merged with `WHATSAPP_*` environment variables
//! - Client: outbound text/template messages and webhook token verification
//! - Handlers: send error normalization and inbound webhook dispatch
//! - Actions: `sendMessage`, `handleWebhook` and `verifyWebhook` for the host
//!
//! Nothing is constructed at load time; hosts call [`plugin`] during startup.
//!
//! # Setup
//!
//! 1. Create a Meta Business account and add the WhatsApp product
//! 2. Copy the access token and the phone number ID
//! 3. Choose a webhook verify token and register the callback URL

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Cloud API HTTP client.
pub mod client;
/// Configuration resolution and validation.
pub mod config;
/// Error types.
pub mod error;
/// Send and webhook handlers.
pub mod handlers;
/// Wire types for outbound requests and inbound webhooks.
pub mod types;
/// Log masking helpers.
pub mod util;

pub mod actions;
mod plugin;

pub use actions::WhatsAppParams;
pub use client::WhatsAppClient;
pub use config::{PartialConfig, WhatsAppConfig};
pub use error::{Error, Result};
pub use handlers::{LoggingListener, MessageHandler, WebhookHandler, WebhookListener, WebhookSummary};
pub use plugin::{WhatsAppPlugin, PLUGIN_DESCRIPTION, PLUGIN_NAME};
pub use types::*;

/// Build the plugin from explicit configuration plus the environment
///
/// This is the host's startup entry point.
///
/// # Errors
/// Returns [`Error::Configuration`] when the access token or phone number ID
/// is missing from both `partial` and the environment.
pub fn plugin(partial: PartialConfig) -> Result<WhatsAppPlugin> {
    WhatsAppPlugin::new(partial)
}
