//! Bot configuration, loaded once from a TOML file at startup.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    bot_token: Option<String>,
    bot_token_file: Option<PathBuf>,

    #[serde(default)]
    pub admin_ids: Vec<i64>,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Channels the user must join before the bot is usable.
    #[serde(default)]
    pub required_channels: Vec<RequiredChannel>,

    /// Channel for activity notifications; `None` disables them.
    pub notification_channel: Option<String>,

    #[serde(default = "default_welcome_image")]
    pub welcome_image_url: String,
    #[serde(default = "default_success_image")]
    pub success_image_url: String,
    #[serde(default = "default_tutorial_url")]
    pub tutorial_url: String,

    #[serde(default)]
    pub links: ContactLinks,

    #[serde(default)]
    pub transport: Transport,
    pub webhook_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_broadcast_delay_ms")]
    pub broadcast_delay_ms: u64,

    /// TrueType font for the notification image; when unset, common
    /// system locations are tried.
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequiredChannel {
    pub username: String,
    pub invite_link: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactLinks {
    #[serde(default = "default_admin_contact")]
    pub admin_contact: String,
    #[serde(default = "default_announcements")]
    pub announcements: String,
    #[serde(default = "default_support")]
    pub support: String,
}

impl Default for ContactLinks {
    fn default() -> Self {
        Self {
            admin_contact: default_admin_contact(),
            announcements: default_announcements(),
            support: default_support(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Polling,
    Webhook,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/airtime-bot/airtime-bot.db")
}

fn default_welcome_image() -> String {
    "https://envs.sh/rXD.jpg".to_string()
}

fn default_success_image() -> String {
    "https://envs.sh/rX2.jpg".to_string()
}

fn default_tutorial_url() -> String {
    "https://www.youtube.com/@Freenethubtech".to_string()
}

fn default_admin_contact() -> String {
    "https://t.me/Silando".to_string()
}

fn default_announcements() -> String {
    "https://t.me/megahubbots".to_string()
}

fn default_support() -> String {
    "https://t.me/Freenethubz".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_broadcast_delay_ms() -> u64 {
    100
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.transport == Transport::Webhook && self.webhook_url.is_none() {
            anyhow::bail!("transport = \"webhook\" requires webhook_url to be set");
        }
        for channel in &self.required_channels {
            if channel.username.trim().is_empty() {
                anyhow::bail!("required_channels entry with empty username");
            }
        }
        Ok(())
    }

    /// Resolves the bot token: inline value, token file, or the
    /// `TELEGRAM_BOT_TOKEN` environment variable, in that order.
    pub fn bot_token(&self) -> Result<String, anyhow::Error> {
        if let Some(token) = self.bot_token.as_deref() {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
        if let Some(path) = &self.bot_token_file {
            let token = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read token file {}", path.display()))?;
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }
        anyhow::bail!("Bot token is not configured (bot_token, bot_token_file or TELEGRAM_BOT_TOKEN)")
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Channel username normalized to the `@name` form Telegram expects.
    pub fn channel_handle(channel: &RequiredChannel) -> String {
        let name = channel.username.trim();
        if name.starts_with('@') {
            name.to_string()
        } else {
            format!("@{}", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            bot_token = "123:abc"
            admin_ids = [1]
            "#,
        )
        .unwrap();
        assert_eq!(config.transport, Transport::Polling);
        assert_eq!(config.port, 10000);
        assert_eq!(config.broadcast_delay_ms, 100);
        assert!(config.required_channels.is_empty());
        assert!(config.is_admin(1));
        assert!(!config.is_admin(2));
        assert_eq!(config.bot_token().unwrap(), "123:abc");
    }

    #[test]
    fn webhook_transport_requires_url() {
        let config: Config = toml::from_str(
            r#"
            bot_token = "123:abc"
            transport = "webhook"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn channel_handle_normalizes_at_sign() {
        let channel = RequiredChannel {
            username: "megahubbots".to_string(),
            invite_link: "https://t.me/megahubbots".to_string(),
        };
        assert_eq!(Config::channel_handle(&channel), "@megahubbots");
        let channel = RequiredChannel {
            username: "@megahubbots".to_string(),
            invite_link: "https://t.me/megahubbots".to_string(),
        };
        assert_eq!(Config::channel_handle(&channel), "@megahubbots");
    }
}
