use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Array whose `null` elements are skipped
fn present_items<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.map(|items| items.into_iter().flatten().collect()))
}

// ============================================================================
// Outbound
// ============================================================================

/// Message to send through the Cloud API
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Recipient phone number or WhatsApp ID
    pub to: String,
    /// What to send
    pub content: MessageContent,
}

/// Outbound message body, keyed by the provider's `type` field
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Free-form text
    Text(String),
    /// Pre-approved message template
    Template(Template),
}

impl OutboundMessage {
    /// Text message
    #[must_use]
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            content: MessageContent::Text(body.into()),
        }
    }

    /// Template message
    #[must_use]
    pub fn template(to: impl Into<String>, template: Template) -> Self {
        Self {
            to: to.into(),
            content: MessageContent::Template(template),
        }
    }

    /// Value of the provider's `type` field
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        self.content.message_type()
    }
}

impl MessageContent {
    /// Value of the provider's `type` field
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Template(_) => "template",
        }
    }
}

/// Message template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template name as registered with the provider
    pub name: String,
    /// Template language
    pub language: TemplateLanguage,
    /// Header/body/button substitutions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<TemplateComponent>>,
    /// Provider fields not modelled above, sent back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    /// Template without components
    #[must_use]
    pub fn new(name: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: TemplateLanguage {
                code: language_code.into(),
                extra: Map::new(),
            },
            components: None,
            extra: Map::new(),
        }
    }

    /// Append a component
    #[must_use]
    pub fn with_component(mut self, component: TemplateComponent) -> Self {
        self.components.get_or_insert_with(Vec::new).push(component);
        self
    }
}

/// Template language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLanguage {
    /// Locale code (e.g. `en_US`)
    pub code: String,
    /// Other language fields (`policy`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Template component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    /// Component type (header, body, button)
    #[serde(rename = "type")]
    pub component_type: String,
    /// Substitution parameters, in placeholder order
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
    /// Other component fields (`sub_type`, `index`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateComponent {
    /// Component with no parameters yet
    #[must_use]
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            parameters: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn with_parameter(mut self, parameter: TemplateParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Template parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    /// Parameter type (text, currency, ...)
    #[serde(rename = "type")]
    pub parameter_type: String,
    /// Text value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Payload of non-text parameters (`image`, `currency`, `date_time`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateParameter {
    /// Text parameter
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parameter_type: "text".to_string(),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }
}

/// Cloud API response to a send request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendResponse {
    /// Always `whatsapp`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messaging_product: Option<String>,
    /// Resolved recipients
    #[serde(default)]
    pub contacts: Vec<ResponseContact>,
    /// Accepted messages
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
}

impl SendResponse {
    /// ID of the first accepted message
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }
}

/// Recipient as resolved by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseContact {
    /// Number as sent
    pub input: String,
    /// WhatsApp ID
    pub wa_id: String,
}

/// Accepted message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Message ID (`wamid.*`)
    pub id: String,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: i64,
}

// ============================================================================
// Inbound webhook
// ============================================================================

/// Object tag carried by WhatsApp Business webhook deliveries
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

/// Incoming webhook event from WhatsApp Cloud API
///
/// Everything below `object` may be missing or `null`; absence means there
/// is nothing to dispatch, never a parse error. `null` array elements are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    /// Object type (should be "whatsapp_business_account")
    #[serde(deserialize_with = "null_as_default")]
    pub object: String,
    /// Entry array
    #[serde(deserialize_with = "present_items", skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<WebhookEntry>>,
}

/// Webhook entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEntry {
    /// Business Account ID
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Changes array
    #[serde(deserialize_with = "present_items", skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<WebhookChange>>,
}

/// Webhook change event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookChange {
    /// Value containing the actual message data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<WebhookValue>,
    /// Field name
    #[serde(deserialize_with = "null_as_default")]
    pub field: String,
}

/// Webhook value containing message data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookValue {
    /// Messaging product
    #[serde(deserialize_with = "null_as_default")]
    pub messaging_product: String,
    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WebhookMetadata>,
    /// Contacts (sender info)
    #[serde(deserialize_with = "present_items", skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<WebhookContact>>,
    /// Statuses (delivery receipts)
    #[serde(deserialize_with = "present_items", skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<StatusUpdate>>,
    /// Messages
    #[serde(deserialize_with = "present_items", skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<InboundMessage>>,
}

/// Webhook metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookMetadata {
    /// Display phone number
    #[serde(deserialize_with = "null_as_default")]
    pub display_phone_number: String,
    /// Phone number ID
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number_id: String,
}

/// Webhook contact (sender info)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookContact {
    /// Profile info
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<WebhookProfile>,
    /// Phone number
    #[serde(deserialize_with = "null_as_default")]
    pub wa_id: String,
}

/// Webhook profile (user profile)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookProfile {
    /// Display name
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// Inbound message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundMessage {
    /// Sender phone number
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
    /// Message ID
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Timestamp
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Message type
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub message_type: String,
    /// Text content (for text messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

/// Text content in message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    /// Message body
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

/// Delivery status update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    /// Message ID
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Status (sent, delivered, read, failed)
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    /// Timestamp
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Recipient ID
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_id: String,
}

impl WebhookEvent {
    /// Whether the delivery is tagged as a WhatsApp Business payload
    #[must_use]
    pub fn is_business_account(&self) -> bool {
        self.object == BUSINESS_ACCOUNT_OBJECT
    }

    /// Every present change value, across all entries and changes, in payload order
    pub fn values(&self) -> impl Iterator<Item = &WebhookValue> {
        let entries = self.entry.as_deref().unwrap_or_default();
        entries.iter().flat_map(WebhookEntry::values)
    }

    /// Every inbound message, in payload order
    pub fn messages(&self) -> impl Iterator<Item = &InboundMessage> {
        self.values().flat_map(WebhookValue::messages)
    }

    /// Every status update, in payload order
    pub fn statuses(&self) -> impl Iterator<Item = &StatusUpdate> {
        self.values().flat_map(WebhookValue::statuses)
    }
}

impl WebhookEntry {
    /// Present change values of this entry
    pub fn values(&self) -> impl Iterator<Item = &WebhookValue> {
        let changes = self.changes.as_deref().unwrap_or_default();
        changes.iter().filter_map(|change| change.value.as_ref())
    }
}

impl WebhookValue {
    /// Inbound messages, empty when absent
    #[must_use]
    pub fn messages(&self) -> &[InboundMessage] {
        self.messages.as_deref().unwrap_or_default()
    }

    /// Status updates, empty when absent
    #[must_use]
    pub fn statuses(&self) -> &[StatusUpdate] {
        self.statuses.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> serde_json::Value {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "102290129340398",
                "changes": [{
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15550783881",
                            "phone_number_id": "106540352242922"
                        },
                        "contacts": [{ "profile": { "name": "Sheena Nelson" }, "wa_id": "16505551234" }],
                        "messages": [{
                            "from": "16505551234",
                            "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                            "timestamp": "1749416383",
                            "type": "text",
                            "text": { "body": "Does it come in another color?" }
                        }]
                    },
                    "field": "messages"
                }]
            }]
        })
    }

    #[test]
    fn test_parse_full_payload() {
        let event: WebhookEvent = serde_json::from_value(sample_payload()).unwrap();

        assert!(event.is_business_account());
        let messages: Vec<_> = event.messages().collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, "text");
        assert_eq!(
            messages[0].text.as_ref().map(|t| t.body.as_str()),
            Some("Does it come in another color?")
        );
        assert_eq!(event.statuses().count(), 0);

        let value = event.values().next().unwrap();
        let contacts = value.contacts.as_deref().unwrap_or_default();
        assert_eq!(
            contacts[0].profile.as_ref().map(|p| p.name.as_str()),
            Some("Sheena Nelson")
        );
    }

    #[test]
    fn test_missing_levels_parse_as_empty() {
        let payloads = [
            serde_json::json!({ "object": "whatsapp_business_account" }),
            serde_json::json!({ "object": "whatsapp_business_account", "entry": [] }),
            serde_json::json!({ "object": "whatsapp_business_account", "entry": [{ "id": "1" }] }),
            serde_json::json!({
                "object": "whatsapp_business_account",
                "entry": [{ "id": "1", "changes": [{ "field": "messages" }] }]
            }),
            serde_json::json!({
                "object": "whatsapp_business_account",
                "entry": [{ "id": "1", "changes": [{ "field": "messages", "value": {} }] }]
            }),
        ];

        for payload in payloads {
            let event: WebhookEvent = serde_json::from_value(payload.clone()).unwrap();
            assert_eq!(event.messages().count(), 0, "payload: {payload}");
            assert_eq!(event.statuses().count(), 0, "payload: {payload}");
        }
    }

    #[test]
    fn test_reserialize_keeps_shape() {
        let event: WebhookEvent = serde_json::from_value(sample_payload()).unwrap();
        let json = serde_json::to_string(&event).unwrap();
        let reparsed: WebhookEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event, reparsed);
        assert!(!json.contains("statuses"));
    }

    #[test]
    fn test_template_serialization() {
        let template = Template::new("greeting", "en_US");
        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            serde_json::json!({ "name": "greeting", "language": { "code": "en_US" } })
        );

        let template = template
            .with_component(TemplateComponent::new("body").with_parameter(TemplateParameter::text("Ana")));
        assert_eq!(
            serde_json::to_value(&template).unwrap()["components"],
            serde_json::json!([{ "type": "body", "parameters": [{ "type": "text", "text": "Ana" }] }])
        );
    }

    #[test]
    fn test_template_keeps_unmodelled_fields() {
        let content = serde_json::json!({
            "name": "order_update",
            "language": { "code": "en_US", "policy": "deterministic" },
            "components": [
                {
                    "type": "header",
                    "parameters": [{ "type": "image", "image": { "link": "https://example.com/box.png" } }]
                },
                {
                    "type": "body",
                    "parameters": [
                        { "type": "text", "text": "Ana" },
                        {
                            "type": "currency",
                            "currency": { "fallback_value": "$10", "code": "USD", "amount_1000": 10000 }
                        }
                    ]
                },
                { "type": "button", "sub_type": "url", "index": "0", "parameters": [] }
            ]
        });

        let template: Template = serde_json::from_value(content.clone()).unwrap();
        assert_eq!(template.language.extra["policy"], "deterministic");
        assert_eq!(serde_json::to_value(&template).unwrap(), content);
    }

    #[test]
    fn test_null_levels_parse_as_empty() {
        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [
                null,
                {
                    "id": null,
                    "changes": [
                        null,
                        {
                            "field": null,
                            "value": {
                                "messaging_product": null,
                                "metadata": null,
                                "messages": [null, { "from": "16505551234", "id": "wamid.1", "timestamp": "1", "type": "text" }],
                                "statuses": [{ "id": "wamid.2", "status": "sent", "timestamp": "2" }]
                            }
                        }
                    ]
                }
            ]
        });

        let event: WebhookEvent = serde_json::from_value(payload).unwrap();
        let messages: Vec<_> = event.messages().collect();
        let statuses: Vec<_> = event.statuses().collect();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "wamid.1");
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].recipient_id, "");
    }

    #[test]
    fn test_send_response_message_id() {
        let resp: SendResponse = serde_json::from_value(serde_json::json!({
            "messaging_product": "whatsapp",
            "contacts": [{ "input": "+1234567890", "wa_id": "1234567890" }],
            "messages": [{ "id": "wamid.abc" }]
        }))
        .unwrap();

        assert_eq!(resp.message_id(), Some("wamid.abc"));
        assert_eq!(SendResponse::default().message_id(), None);
    }
}
