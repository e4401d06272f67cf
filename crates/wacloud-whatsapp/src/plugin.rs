use crate::actions::{HandleWebhookAction, SendMessageAction, VerifyWebhookAction, WhatsAppParams};
use crate::client::WhatsAppClient;
use crate::config::{PartialConfig, WhatsAppConfig};
use crate::error::Result;
use crate::handlers::{LoggingListener, MessageHandler, WebhookHandler, WebhookListener, WebhookSummary};
use crate::types::{OutboundMessage, SendResponse, WebhookEvent};

use std::sync::Arc;
use tracing::info;
use wacloud_core::{ActionRegistry, Plugin};

/// Plugin name reported to the host
pub const PLUGIN_NAME: &str = "WhatsApp Cloud API Plugin";
/// Plugin description reported to the host
pub const PLUGIN_DESCRIPTION: &str =
    "A plugin for integrating WhatsApp Cloud API with your application.";

/// WhatsApp Cloud API plugin
///
/// Owns the client and both handlers, and publishes `sendMessage`,
/// `handleWebhook` and `verifyWebhook` to the host. Cloning is cheap and
/// every clone shares the same HTTP client.
#[derive(Clone)]
pub struct WhatsAppPlugin {
    client: Arc<WhatsAppClient>,
    message_handler: MessageHandler,
    webhook_handler: WebhookHandler,
    actions: Arc<ActionRegistry<WhatsAppParams>>,
}

impl WhatsAppPlugin {
    /// Resolve configuration (explicit values, then `WHATSAPP_*` environment) and build
    ///
    /// # Errors
    /// Fails when a required credential is missing or the HTTP client cannot be built.
    pub fn new(partial: PartialConfig) -> Result<Self> {
        Self::with_listener(partial, Arc::new(LoggingListener))
    }

    /// Like [`WhatsAppPlugin::new`], with a host-supplied webhook listener
    pub fn with_listener(partial: PartialConfig, listener: Arc<dyn WebhookListener>) -> Result<Self> {
        let config = WhatsAppConfig::resolve(partial)?;
        Self::from_config_with_listener(config, listener)
    }

    /// Build from an already validated configuration
    pub fn from_config(config: WhatsAppConfig) -> Result<Self> {
        Self::from_config_with_listener(config, Arc::new(LoggingListener))
    }

    /// Build from an already validated configuration and a webhook listener
    pub fn from_config_with_listener(
        config: WhatsAppConfig,
        listener: Arc<dyn WebhookListener>,
    ) -> Result<Self> {
        let client = Arc::new(WhatsAppClient::new(config)?);
        let message_handler = MessageHandler::new(Arc::clone(&client));
        let webhook_handler = WebhookHandler::new(listener);

        let mut actions: ActionRegistry<WhatsAppParams> = ActionRegistry::new();
        actions.register(Arc::new(SendMessageAction::new(message_handler.clone())));
        actions.register(Arc::new(HandleWebhookAction::new(webhook_handler.clone())));
        actions.register(Arc::new(VerifyWebhookAction::new(Arc::clone(&client))));

        info!(actions = ?actions.names(), "{PLUGIN_NAME} ready");

        Ok(Self {
            client,
            message_handler,
            webhook_handler,
            actions: Arc::new(actions),
        })
    }

    /// Actions published to the host, in registration order
    #[must_use]
    pub fn actions(&self) -> &ActionRegistry<WhatsAppParams> {
        &self.actions
    }

    /// Send a message without going through action validation
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<SendResponse> {
        self.message_handler.send(message).await
    }

    /// Dispatch a webhook payload without going through action validation
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> Result<WebhookSummary> {
        self.webhook_handler.handle(event).await
    }

    /// Check a webhook verification token
    #[must_use]
    pub fn verify_webhook(&self, token: &str) -> bool {
        self.client.verify_webhook(token)
    }
}

impl Plugin for WhatsAppPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn description(&self) -> &str {
        PLUGIN_DESCRIPTION
    }
}
