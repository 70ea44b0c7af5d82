//! Telegram transport settings.

use config::ConfigError;
use ninja_translate_core::config::{build_config, CoreSettings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default port of the liveness endpoint.
pub const DEFAULT_PORT: u16 = 8080;

/// Telegram transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    #[serde(default)]
    pub bot_token: String,
    /// Port of the liveness endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to run the liveness endpoint at all.
    #[serde(default = "default_health_server_enabled")]
    pub health_server_enabled: bool,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_health_server_enabled() -> bool {
    true
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            port: default_port(),
            health_server_enabled: default_health_server_enabled(),
        }
    }
}

impl TelegramSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the bot cannot start with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` when the bot token is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Message("BOT_TOKEN is missing".into()));
        }
        Ok(())
    }
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Core settings shared across transport handlers.
    pub core: Arc<CoreSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(core: CoreSettings, telegram: TelegramSettings) -> Self {
        Self {
            core: Arc::new(core),
            telegram: Arc::new(telegram),
        }
    }
}
