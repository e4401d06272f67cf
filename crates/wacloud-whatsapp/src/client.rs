use crate::config::WhatsAppConfig;
use crate::error::{Error, Result};
use crate::types::{ApiErrorEnvelope, MessageContent, OutboundMessage, SendResponse, Template};
use crate::util::mask_phone;

use serde::Serialize;
use tracing::{debug, info, instrument};

/// Cloud API send request body
#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<&'a Template>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

impl<'a> From<&'a OutboundMessage> for SendRequest<'a> {
    fn from(message: &'a OutboundMessage) -> Self {
        let (text, template) = match &message.content {
            MessageContent::Text(body) => (Some(TextBody { body }), None),
            MessageContent::Template(template) => (None, Some(template)),
        };

        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &message.to,
            message_type: message.message_type(),
            text,
            template,
        }
    }
}

/// WhatsApp Cloud API client
///
/// Holds the validated configuration and one HTTP client shared by every call.
#[derive(Debug)]
pub struct WhatsAppClient {
    config: WhatsAppConfig,
    http: reqwest::Client,
}

impl WhatsAppClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: WhatsAppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

        info!(
            phone_number_id = %config.phone_number_id,
            api_version = %config.api_version,
            "WhatsApp Cloud API client initialized"
        );

        Ok(Self { config, http })
    }

    /// Send a message; one request, no retry
    #[instrument(skip(self, message), fields(to = %mask_phone(&message.to), kind = message.message_type()))]
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<SendResponse> {
        let url = self.config.messages_url();
        debug!(%url, "Sending WhatsApp message");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.access_token())
            .json(&SendRequest::from(message))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => Error::Transport(format!(
                    "API error {}: {}",
                    envelope.error.code, envelope.error.message
                )),
                Err(_) => Error::Transport(format!("HTTP {status}")),
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("Invalid API response: {e}")))?;

        debug!(message_id = ?parsed.message_id(), "WhatsApp message accepted");
        Ok(parsed)
    }

    /// Check a webhook verification token against the configured one
    ///
    /// An unconfigured token never matches.
    #[must_use]
    pub fn verify_webhook(&self, candidate: &str) -> bool {
        let verified = self
            .config
            .webhook_verify_token
            .as_deref()
            .is_some_and(|expected| expected == candidate);

        if verified {
            info!("WhatsApp webhook verified");
        } else {
            debug!("WhatsApp webhook token mismatch");
        }
        verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WhatsAppClient {
        let config = WhatsAppConfig::new("test-token", "1234").with_base_url(server.uri());
        WhatsAppClient::new(config).expect("Failed to create client")
    }

    #[test]
    fn test_text_request_body() {
        let message = OutboundMessage::text("+1234567890", "Hello");
        let body = serde_json::to_value(SendRequest::from(&message)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "+1234567890",
                "type": "text",
                "text": { "body": "Hello" }
            })
        );
    }

    #[test]
    fn test_template_request_body() {
        let message = OutboundMessage::template("+1234567890", Template::new("greeting", "en_US"));
        let body = serde_json::to_value(SendRequest::from(&message)).unwrap();

        assert_eq!(body["type"], "template");
        assert_eq!(
            body["template"],
            serde_json::json!({ "name": "greeting", "language": { "code": "en_US" } })
        );
        assert!(body.get("text").is_none());
    }

    #[test]
    fn test_template_request_body_sends_content_unchanged() {
        let content = serde_json::json!({
            "name": "order_update",
            "language": { "code": "en_US", "policy": "deterministic" },
            "components": [{
                "type": "header",
                "parameters": [{ "type": "image", "image": { "link": "https://example.com/box.png" } }]
            }]
        });
        let message = crate::actions::parse_outbound(&serde_json::json!({
            "type": "template",
            "to": "+1234567890",
            "content": content
        }))
        .unwrap();

        let body = serde_json::to_value(SendRequest::from(&message)).unwrap();
        assert_eq!(body["template"], content);
    }

    #[test]
    fn test_verify_webhook() {
        let config = WhatsAppConfig::new("token", "1234").with_webhook_verify_token("abc123");
        let client = WhatsAppClient::new(config).unwrap();

        assert!(client.verify_webhook("abc123"));
        assert!(!client.verify_webhook("abc1234"));
        assert!(!client.verify_webhook(""));
    }

    #[test]
    fn test_verify_webhook_unconfigured() {
        let client = WhatsAppClient::new(WhatsAppConfig::new("token", "1234")).unwrap();

        assert!(!client.verify_webhook(""));
        assert!(!client.verify_webhook("anything"));
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v17.0/1234/messages"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "+1234567890",
                "type": "text",
                "text": { "body": "Hello" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "contacts": [{ "input": "+1234567890", "wa_id": "1234567890" }],
                "messages": [{ "id": "wamid.HBgL" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resp = client
            .send_message(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap();

        assert_eq!(resp.message_id(), Some("wamid.HBgL"));
        assert_eq!(resp.contacts[0].wa_id, "1234567890");
    }

    #[tokio::test]
    async fn test_send_message_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Invalid OAuth access token.",
                    "type": "OAuthException",
                    "code": 190
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap_err();

        match err {
            Error::Transport(msg) => {
                assert_eq!(msg, "API error 190: Invalid OAuth access token.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_message_plain_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(msg) if msg.starts_with("HTTP 502")));
    }

    #[tokio::test]
    async fn test_send_message_network_error() {
        let config = WhatsAppConfig::new("token", "1234").with_base_url("http://127.0.0.1:1");
        let client = WhatsAppClient::new(config).unwrap();

        let err = client
            .send_message(&OutboundMessage::text("+1234567890", "Hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
    }
}
