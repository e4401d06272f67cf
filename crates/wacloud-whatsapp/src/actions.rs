//! Actions published to the host runtime
//!
//! Host parameters arrive as untyped JSON. Each action's `validate` narrows
//! them into one [`WhatsAppParams`] variant; `handle` only ever sees the
//! variant it accepted.

use crate::client::WhatsAppClient;
use crate::handlers::{MessageHandler, WebhookHandler};
use crate::types::{OutboundMessage, Template, WebhookEvent, BUSINESS_ACCOUNT_OBJECT};

use serde_json::Value;
use std::sync::Arc;
use wacloud_core::{
    Action, ActionDefinition, ActionExample, Error as ActionError, Result as ActionResult,
    Runtime, Validation,
};

/// Name of the send action
pub const SEND_MESSAGE: &str = "sendMessage";
/// Name of the webhook action
pub const HANDLE_WEBHOOK: &str = "handleWebhook";
/// Name of the verification action
pub const VERIFY_WEBHOOK: &str = "verifyWebhook";

/// Parameter shapes accepted by the WhatsApp actions
#[derive(Debug, Clone, PartialEq)]
pub enum WhatsAppParams {
    /// Outbound message for `sendMessage`
    SendMessage(OutboundMessage),
    /// Parsed webhook payload for `handleWebhook`
    Webhook(WebhookEvent),
    /// Candidate token for `verifyWebhook`
    Token(String),
}

fn wrong_variant(action: &str) -> ActionError {
    ActionError::InvalidInput(format!("{action} received parameters for another action"))
}

/// Narrow `{ to, content, type? }` into an outbound message
///
/// `type` may be omitted; it is then inferred from `content` (string for
/// text, object for template).
pub fn parse_outbound(params: &Value) -> std::result::Result<OutboundMessage, String> {
    let Some(fields) = params.as_object() else {
        return Err("expected an object with `to` and `content`".to_string());
    };

    let to = match fields.get("to").and_then(Value::as_str) {
        Some(to) if !to.is_empty() => to,
        _ => return Err("missing recipient `to`".to_string()),
    };

    let content = match fields.get("content") {
        Some(Value::Null) | None => return Err("missing `content`".to_string()),
        Some(Value::String(body)) if body.is_empty() => {
            return Err("missing `content`".to_string())
        }
        Some(content) => content,
    };

    let declared = match fields.get("type") {
        Some(Value::Null) | None => None,
        Some(Value::String(kind)) => Some(kind.as_str()),
        Some(_) => return Err("`type` must be a string".to_string()),
    };

    match (declared, content) {
        (None | Some("text"), Value::String(body)) => Ok(OutboundMessage::text(to, body.clone())),
        (None | Some("template"), Value::Object(_)) => {
            serde_json::from_value::<Template>(content.clone())
                .map(|template| OutboundMessage::template(to, template))
                .map_err(|e| format!("invalid template: {e}"))
        }
        (Some("text"), _) => Err("text messages need string `content`".to_string()),
        (Some("template"), _) => Err("template messages need object `content`".to_string()),
        (Some(other), _) => Err(format!("unsupported message type `{other}`")),
        (None, _) => Err("`content` must be a string or a template object".to_string()),
    }
}

/// `sendMessage`: send a text or template message
pub struct SendMessageAction {
    definition: ActionDefinition,
    handler: MessageHandler,
}

impl SendMessageAction {
    /// Create the action around a message handler
    pub fn new(handler: MessageHandler) -> Self {
        let definition = ActionDefinition::new(SEND_MESSAGE, "Send a message through WhatsApp")
            .with_similes(["send", "message", "whatsapp"])
            .with_example(vec![
                ActionExample::says("{{user1}}", "Send \"Hello\" to +1234567890"),
                ActionExample::answers("{{user2}}", "Message sent successfully", SEND_MESSAGE),
            ]);

        Self {
            definition,
            handler,
        }
    }
}

#[async_trait::async_trait]
impl Action<WhatsAppParams> for SendMessageAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    fn validate(&self, params: &Value) -> Validation<WhatsAppParams> {
        match parse_outbound(params) {
            Ok(message) => Validation::Valid(WhatsAppParams::SendMessage(message)),
            Err(reason) => Validation::Invalid(reason),
        }
    }

    async fn handle(&self, _runtime: &dyn Runtime, params: WhatsAppParams) -> ActionResult<Value> {
        let WhatsAppParams::SendMessage(message) = params else {
            return Err(wrong_variant(SEND_MESSAGE));
        };

        let response = self
            .handler
            .send(&message)
            .await
            .map_err(|e| ActionError::Execution(e.to_string()))?;

        serde_json::to_value(response).map_err(|e| ActionError::Execution(e.to_string()))
    }
}

/// `handleWebhook`: dispatch an inbound webhook payload
pub struct HandleWebhookAction {
    definition: ActionDefinition,
    handler: WebhookHandler,
}

impl HandleWebhookAction {
    /// Create the action around a webhook handler
    pub fn new(handler: WebhookHandler) -> Self {
        let definition =
            ActionDefinition::new(HANDLE_WEBHOOK, "Handle incoming WhatsApp webhook events")
                .with_similes(["webhook", "handle", "event"])
                .with_example(vec![
                    ActionExample::says("{{user1}}", "Handle incoming message webhook"),
                    ActionExample::answers(
                        "{{user2}}",
                        "Webhook handled successfully",
                        HANDLE_WEBHOOK,
                    ),
                ]);

        Self {
            definition,
            handler,
        }
    }
}

#[async_trait::async_trait]
impl Action<WhatsAppParams> for HandleWebhookAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    fn validate(&self, params: &Value) -> Validation<WhatsAppParams> {
        let event = match serde_json::from_value::<WebhookEvent>(params.clone()) {
            Ok(event) => event,
            Err(e) => return Validation::invalid(format!("malformed webhook payload: {e}")),
        };

        if !event.is_business_account() {
            return Validation::invalid(format!("`object` must be \"{BUSINESS_ACCOUNT_OBJECT}\""));
        }
        Validation::Valid(WhatsAppParams::Webhook(event))
    }

    async fn handle(&self, _runtime: &dyn Runtime, params: WhatsAppParams) -> ActionResult<Value> {
        let WhatsAppParams::Webhook(event) = params else {
            return Err(wrong_variant(HANDLE_WEBHOOK));
        };

        let summary = self
            .handler
            .handle(&event)
            .await
            .map_err(|e| ActionError::Execution(e.to_string()))?;

        Ok(serde_json::json!({
            "messages": summary.messages,
            "statuses": summary.statuses,
        }))
    }
}

/// `verifyWebhook`: compare a handshake token with the configured one
pub struct VerifyWebhookAction {
    definition: ActionDefinition,
    client: Arc<WhatsAppClient>,
}

impl VerifyWebhookAction {
    /// Create the action around the API client
    pub fn new(client: Arc<WhatsAppClient>) -> Self {
        let definition = ActionDefinition::new(VERIFY_WEBHOOK, "Verify WhatsApp webhook token")
            .with_similes(["verify", "token", "webhook"])
            .with_example(vec![
                ActionExample::says("{{user1}}", "Verify webhook with token \"abc123\""),
                ActionExample::answers("{{user2}}", "Token verified successfully", VERIFY_WEBHOOK),
            ]);

        Self { definition, client }
    }
}

#[async_trait::async_trait]
impl Action<WhatsAppParams> for VerifyWebhookAction {
    fn definition(&self) -> &ActionDefinition {
        &self.definition
    }

    fn validate(&self, params: &Value) -> Validation<WhatsAppParams> {
        match params.as_str() {
            Some(token) if !token.is_empty() => {
                Validation::Valid(WhatsAppParams::Token(token.to_string()))
            }
            _ => Validation::invalid("expected a non-empty token string"),
        }
    }

    async fn handle(&self, _runtime: &dyn Runtime, params: WhatsAppParams) -> ActionResult<Value> {
        let WhatsAppParams::Token(token) = params else {
            return Err(wrong_variant(VERIFY_WEBHOOK));
        };

        Ok(Value::Bool(self.client.verify_webhook(&token)))
    }
}
