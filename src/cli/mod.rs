//! CLI module for wacloud
//!
//! Each command builds the plugin and goes through the same action
//! dispatch a host runtime would use:
//! - `actions`: list published actions
//! - `send`: `sendMessage`
//! - `webhook`: `handleWebhook`
//! - `verify`: `verifyWebhook`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use tracing::info;
use wacloud_core::{Plugin, StaticRuntime};
use wacloud_whatsapp::actions::{HANDLE_WEBHOOK, SEND_MESSAGE, VERIFY_WEBHOOK};
use wacloud_whatsapp::{Template, WhatsAppPlugin};

/// WhatsApp Cloud API adapter shell
#[derive(Parser, Debug)]
#[command(name = "wacloud")]
#[command(about = "Send and receive WhatsApp Cloud API messages through plugin actions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the actions the plugin publishes
    Actions,
    /// Send a text or template message
    Send {
        /// Recipient phone number
        #[arg(long)]
        to: String,
        /// Text body
        #[arg(long, conflicts_with = "template")]
        text: Option<String>,
        /// Template name
        #[arg(long)]
        template: Option<String>,
        /// Template language code
        #[arg(long, default_value = "en_US")]
        language: String,
    },
    /// Dispatch a webhook payload read from a file (`-` for stdin)
    Webhook {
        /// Path to a JSON payload
        path: String,
    },
    /// Check a webhook verification token
    Verify {
        /// Token received in the verification handshake
        token: String,
    },
}

fn build_plugin() -> Result<(WhatsAppPlugin, StaticRuntime)> {
    let app = crate::loader::load_config()?;
    let plugin = wacloud_whatsapp::plugin(app.whatsapp)?;
    info!("Loaded {}", plugin.name());
    Ok((plugin, StaticRuntime::new(app.agent_id)))
}

fn send_params(
    to: String,
    text: Option<String>,
    template: Option<String>,
    language: String,
) -> Result<serde_json::Value> {
    match (text, template) {
        (Some(body), None) => Ok(serde_json::json!({
            "type": "text",
            "to": to,
            "content": body,
        })),
        (None, Some(name)) => Ok(serde_json::json!({
            "type": "template",
            "to": to,
            "content": Template::new(name, language),
        })),
        _ => bail!("pass exactly one of --text or --template"),
    }
}

fn read_payload(path: &str) -> Result<serde_json::Value> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?
    };

    serde_json::from_str(&raw).context("Webhook payload is not valid JSON")
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let (plugin, runtime) = build_plugin()?;
    let actions = plugin.actions();

    match command {
        Commands::Actions => {
            for def in actions.definitions() {
                println!("{:<14} {}", def.name, def.description);
                println!("{:<14} similes: {}", "", def.similes.join(", "));
            }
        }
        Commands::Send {
            to,
            text,
            template,
            language,
        } => {
            let params = send_params(to, text, template, language)?;
            let out = actions.dispatch(SEND_MESSAGE, &runtime, &params).await?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Webhook { path } => {
            let params = read_payload(&path)?;
            let out = actions.dispatch(HANDLE_WEBHOOK, &runtime, &params).await?;
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Verify { token } => {
            let out = actions
                .dispatch(VERIFY_WEBHOOK, &runtime, &serde_json::Value::String(token))
                .await?;
            println!("{out}");
            if out != serde_json::Value::Bool(true) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from(["wacloud", "send", "--to", "+1234567890", "--text", "Hi"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Send { ref to, ref text, .. }) if to == "+1234567890" && text.as_deref() == Some("Hi")
        ));
    }

    #[test]
    fn test_cli_rejects_text_and_template() {
        let result = Cli::try_parse_from([
            "wacloud", "send", "--to", "+1", "--text", "Hi", "--template", "greeting",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_send_params() {
        let params = send_params("+1".into(), None, Some("greeting".into()), "en_US".into()).unwrap();
        assert_eq!(params["type"], "template");
        assert_eq!(params["content"]["language"]["code"], "en_US");

        assert!(send_params("+1".into(), None, None, "en_US".into()).is_err());
    }
}
