use crate::error::{Error, Result};
use crate::types::{InboundMessage, StatusUpdate, WebhookEvent};
use crate::util::{mask_for_logging, mask_phone};

use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Per-item callbacks invoked for an inbound webhook
///
/// Hosts implement this to act on incoming messages and delivery receipts.
/// An error aborts the rest of the event.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WebhookListener: Send + Sync {
    /// Called once per inbound message, in payload order
    async fn on_message(&self, message: &InboundMessage) -> anyhow::Result<()>;

    /// Called once per status update, in payload order
    async fn on_status(&self, status: &StatusUpdate) -> anyhow::Result<()>;
}

/// Listener that only logs what it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

#[async_trait::async_trait]
impl WebhookListener for LoggingListener {
    async fn on_message(&self, message: &InboundMessage) -> anyhow::Result<()> {
        let text = message
            .text
            .as_ref()
            .map(|t| mask_for_logging(&t.body))
            .unwrap_or_default();

        info!(
            from = %mask_phone(&message.from),
            id = %message.id,
            kind = %message.message_type,
            %text,
            "Received WhatsApp message"
        );
        Ok(())
    }

    async fn on_status(&self, status: &StatusUpdate) -> anyhow::Result<()> {
        info!(
            id = %status.id,
            status = %status.status,
            recipient = %mask_phone(&status.recipient_id),
            "Received WhatsApp status update"
        );
        Ok(())
    }
}

/// Counts of items dispatched for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookSummary {
    /// Inbound messages handed to the listener
    pub messages: usize,
    /// Status updates handed to the listener
    pub statuses: usize,
}

/// Dispatches inbound webhook events to a [`WebhookListener`]
#[derive(Clone)]
pub struct WebhookHandler {
    listener: Arc<dyn WebhookListener>,
}

impl Default for WebhookHandler {
    fn default() -> Self {
        Self::new(Arc::new(LoggingListener))
    }
}

impl std::fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookHandler").finish_non_exhaustive()
    }
}

impl WebhookHandler {
    /// Create a handler dispatching to `listener`
    pub fn new(listener: Arc<dyn WebhookListener>) -> Self {
        Self { listener }
    }

    /// Dispatch every message, then every status update
    ///
    /// All entries and changes are walked. Missing levels dispatch nothing.
    /// The first listener failure stops the event, so statuses are never
    /// dispatched when a message fails.
    #[instrument(skip(self, event), fields(object = %event.object))]
    pub async fn handle(&self, event: &WebhookEvent) -> Result<WebhookSummary> {
        let mut summary = WebhookSummary::default();

        for message in event.messages() {
            self.listener
                .on_message(message)
                .await
                .map_err(|e| Error::WebhookProcessing(e.to_string()))?;
            summary.messages += 1;
        }

        for status in event.statuses() {
            self.listener
                .on_status(status)
                .await
                .map_err(|e| Error::WebhookProcessing(e.to_string()))?;
            summary.statuses += 1;
        }

        debug!(
            messages = summary.messages,
            statuses = summary.statuses,
            "WhatsApp webhook dispatched"
        );
        Ok(summary)
    }
}
