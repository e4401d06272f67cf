use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable for the access token
pub const ENV_ACCESS_TOKEN: &str = "WHATSAPP_ACCESS_TOKEN";
/// Environment variable for the phone number ID
pub const ENV_PHONE_NUMBER_ID: &str = "WHATSAPP_PHONE_NUMBER_ID";
/// Environment variable for the webhook verify token
pub const ENV_WEBHOOK_TOKEN: &str = "WHATSAPP_WEBHOOK_TOKEN";
/// Environment variable for the business account ID
pub const ENV_BUSINESS_ID: &str = "WHATSAPP_BUSINESS_ID";
/// Environment variable for the Graph API version
pub const ENV_API_VERSION: &str = "WHATSAPP_API_VERSION";
/// Environment variable for the Graph API base URL
pub const ENV_API_BASE_URL: &str = "WHATSAPP_API_BASE_URL";

/// Graph API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "v17.0";
/// Graph API host used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Explicit configuration as supplied by the host; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    /// Access token (from Meta Business Suite)
    pub access_token: Option<String>,
    /// Phone Number ID messages are sent from
    pub phone_number_id: Option<String>,
    /// Token expected in the webhook verification handshake
    pub webhook_verify_token: Option<String>,
    /// Business Account ID
    pub business_account_id: Option<String>,
    /// Graph API version (e.g. `v17.0`)
    pub api_version: Option<String>,
    /// Graph API base URL
    pub base_url: Option<String>,
    /// Request timeout in seconds; `0` means the default
    pub timeout_secs: Option<u64>,
}

/// Validated WhatsApp Cloud API configuration
#[derive(Debug)]
pub struct WhatsAppConfig {
    access_token: SecretString,
    /// Phone Number ID messages are sent from
    pub phone_number_id: String,
    /// Token expected in the webhook verification handshake
    pub webhook_verify_token: Option<String>,
    /// Business Account ID
    pub business_account_id: Option<String>,
    /// Graph API version
    pub api_version: String,
    /// Graph API base URL, without trailing slash
    pub base_url: String,
    /// Timeout applied to every outbound request
    pub timeout: Duration,
}

/// First non-empty candidate
fn pick(explicit: Option<String>, env: Option<String>) -> Option<String> {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| env.filter(|v| !v.is_empty()))
}

impl WhatsAppConfig {
    /// Merge explicit values with `WHATSAPP_*` environment variables and validate
    pub fn resolve(partial: PartialConfig) -> Result<Self> {
        Self::resolve_with(partial, |key| std::env::var(key).ok())
    }

    /// Merge explicit values with values from `lookup` and validate
    ///
    /// Explicit non-empty values win over looked-up ones; empty strings
    /// count as absent.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] naming the access token or the phone
    /// number ID, in that order, when either is still empty.
    pub fn resolve_with<F>(partial: PartialConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = pick(partial.access_token, lookup(ENV_ACCESS_TOKEN)).ok_or(
            Error::Configuration {
                field: "access token",
                env_var: ENV_ACCESS_TOKEN,
            },
        )?;

        let phone_number_id = pick(partial.phone_number_id, lookup(ENV_PHONE_NUMBER_ID)).ok_or(
            Error::Configuration {
                field: "phone number ID",
                env_var: ENV_PHONE_NUMBER_ID,
            },
        )?;

        let webhook_verify_token = pick(partial.webhook_verify_token, lookup(ENV_WEBHOOK_TOKEN));
        let business_account_id = pick(partial.business_account_id, lookup(ENV_BUSINESS_ID));

        let api_version = pick(partial.api_version, lookup(ENV_API_VERSION))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let base_url = pick(partial.base_url, lookup(ENV_API_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // 0 would fail every request
        let timeout_secs = partial
            .timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let timeout = Duration::from_secs(timeout_secs);

        Ok(Self::new(access_token, phone_number_id)
            .with_optional_webhook_verify_token(webhook_verify_token)
            .with_optional_business_account_id(business_account_id)
            .with_api_version(api_version)
            .with_base_url(base_url)
            .with_timeout(timeout))
    }

    /// Create with required fields; no environment is consulted
    #[must_use]
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            phone_number_id: phone_number_id.into(),
            webhook_verify_token: None,
            business_account_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set webhook verify token
    #[must_use]
    pub fn with_webhook_verify_token(self, token: impl Into<String>) -> Self {
        self.with_optional_webhook_verify_token(Some(token.into()))
    }

    fn with_optional_webhook_verify_token(mut self, token: Option<String>) -> Self {
        self.webhook_verify_token = token;
        self
    }

    fn with_optional_business_account_id(mut self, id: Option<String>) -> Self {
        self.business_account_id = id;
        self
    }

    /// Set Graph API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Point the client at another host (a proxy or a test server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bearer token for the Graph API
    pub(crate) fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Get API URL for messages endpoint
    pub(crate) fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, self.phone_number_id
        )
    }
}
