//! Configuration loading
//!
//! Layers an optional `config/wacloud.toml` and `WACLOUD_*` environment
//! overrides. `WHATSAPP_*` fallbacks are applied later by the plugin itself.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use wacloud_whatsapp::PartialConfig;

/// Shell configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Agent identifier passed to action handlers
    pub agent_id: String,
    /// Explicit WhatsApp settings; gaps are filled from `WHATSAPP_*`
    pub whatsapp: PartialConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent_id: "wacloud".to_string(),
            whatsapp: PartialConfig::default(),
        }
    }
}

/// `WACLOUD_*` overrides
///
/// Values stay strings: tokens and phone IDs such as `007` must not be
/// parsed as numbers. `timeout_secs` is parsed when deserialized.
fn environment() -> Environment {
    // WACLOUD_WHATSAPP__PHONE_NUMBER_ID -> whatsapp.phone_number_id
    Environment::with_prefix("WACLOUD")
        .prefix_separator("_")
        .separator("__")
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    load_from(environment())
}

fn load_from(env: Environment) -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::with_name("config/wacloud").required(false))
        .add_source(env)
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
