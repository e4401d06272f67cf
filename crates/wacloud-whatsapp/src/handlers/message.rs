use crate::client::WhatsAppClient;
use crate::error::{Error, Result};
use crate::types::{OutboundMessage, SendResponse};
use crate::util::mask_phone;

use std::sync::Arc;
use tracing::{debug, warn};

/// Sends outbound messages, normalizing every failure into [`Error::MessageSend`]
#[derive(Debug, Clone)]
pub struct MessageHandler {
    client: Arc<WhatsAppClient>,
}

impl MessageHandler {
    /// Create a handler sending through `client`
    pub fn new(client: Arc<WhatsAppClient>) -> Self {
        Self { client }
    }

    /// Send one message; at most one delivery attempt
    pub async fn send(&self, message: &OutboundMessage) -> Result<SendResponse> {
        debug!(to = %mask_phone(&message.to), kind = message.message_type(), "Sending message");

        self.client.send_message(message).await.map_err(|e| {
            warn!(to = %mask_phone(&message.to), error = %e, "Failed to send WhatsApp message");
            match e {
                Error::Transport(detail) => Error::MessageSend(detail),
                other => Error::MessageSend(other.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WhatsAppConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_failure_is_prefixed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "Recipient phone number not in allowed list", "code": 131030 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = WhatsAppConfig::new("token", "1234").with_base_url(server.uri());
        let handler = MessageHandler::new(Arc::new(WhatsAppClient::new(config).unwrap()));

        let err = handler
            .send(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MessageSend(_)));
        assert_eq!(
            err.to_string(),
            "Failed to send WhatsApp message: API error 131030: Recipient phone number not in allowed list"
        );
    }

    #[tokio::test]
    async fn test_send_success_passes_response_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{ "id": "wamid.1" }]
            })))
            .mount(&server)
            .await;

        let config = WhatsAppConfig::new("token", "1234").with_base_url(server.uri());
        let handler = MessageHandler::new(Arc::new(WhatsAppClient::new(config).unwrap()));

        let resp = handler
            .send(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap();
        assert_eq!(resp.message_id(), Some("wamid.1"));
        assert_eq!(resp.messaging_product.as_deref(), Some("whatsapp"));
    }
}
