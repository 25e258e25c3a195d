//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default accent color for added reactions.
fn default_added_color() -> u32 {
    0x00ff00
}

/// Default accent color for removed reactions.
fn default_removed_color() -> u32 {
    0xff0000
}

/// Default icon for the member field on added reactions.
fn default_member_added_icon() -> String {
    "👤".to_string()
}

/// Default icon for the member field on removed reactions.
fn default_member_removed_icon() -> String {
    "👤".to_string()
}

/// Default icon for the emoji field on added reactions.
fn default_emoji_added_icon() -> String {
    "⭐".to_string()
}

/// Default icon for the emoji field on removed reactions.
fn default_emoji_removed_icon() -> String {
    "⭐".to_string()
}

/// Configuration for the reaction-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared inner configuration.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The actual configuration values.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Discord bot token (`DISCORD_TOKEN`).
    pub discord_token: String,
    /// Id of the channel that receives reaction notifications (`LOG_CHANNEL_ID`).
    pub log_channel_id: u64,
    /// Colors and icons used when rendering notifications.
    #[serde(default)]
    pub style: NotifyStyle,
}

/// Static styling applied to every rendered notification.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotifyStyle {
    /// Accent colors per polarity.
    #[serde(default)]
    pub colors: NotifyColors,
    /// Field icons per polarity.
    #[serde(default)]
    pub icons: NotifyIcons,
}

/// Accent colors per polarity, as 24-bit RGB values.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyColors {
    /// Color for added reactions.
    #[serde(default = "default_added_color")]
    pub added: u32,
    /// Color for removed reactions.
    #[serde(default = "default_removed_color")]
    pub removed: u32,
}

impl Default for NotifyColors {
    fn default() -> Self {
        Self {
            added: default_added_color(),
            removed: default_removed_color(),
        }
    }
}

/// Icons prefixed to the notification field labels.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyIcons {
    /// Member field icon for added reactions.
    #[serde(default = "default_member_added_icon")]
    pub member_added: String,
    /// Member field icon for removed reactions.
    #[serde(default = "default_member_removed_icon")]
    pub member_removed: String,
    /// Emoji field icon for added reactions.
    #[serde(default = "default_emoji_added_icon")]
    pub emoji_added: String,
    /// Emoji field icon for removed reactions.
    #[serde(default = "default_emoji_removed_icon")]
    pub emoji_removed: String,
}

impl Default for NotifyIcons {
    fn default() -> Self {
        Self {
            member_added: default_member_added_icon(),
            member_removed: default_member_removed_icon(),
            emoji_added: default_emoji_added_icon(),
            emoji_removed: default_emoji_removed_icon(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and an optional config file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("REACTION_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.discord_token.is_empty() {
            return Err(anyhow::anyhow!("Discord token must not be empty."));
        }

        if result.log_channel_id == 0 {
            return Err(anyhow::anyhow!("Log channel id must be a valid channel snowflake."));
        }

        if result.style.colors.added > 0x00ff_ffff || result.style.colors.removed > 0x00ff_ffff {
            return Err(anyhow::anyhow!("Notification colors must be 24-bit RGB values."));
        }

        Ok(result)
    }
}
