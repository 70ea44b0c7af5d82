//! Configuration and settings management
//!
//! Loads settings from environment variables and defines translation constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Default chat-completions endpoint of the translation backend
pub const DEFAULT_XAI_API_URL: &str = "https://api.x.ai/v1/chat/completions";
/// Default model used for translation
pub const DEFAULT_XAI_MODEL: &str = "grok-3-latest";
/// Sampling temperature; kept low to bias toward literal translation
pub const TRANSLATION_TEMPERATURE: f32 = 0.3;
/// Longest text (in characters) forwarded to the translation backend
pub const MAX_TEXT_LENGTH: usize = 2000;
/// Default subscription re-check interval in minutes
pub const SUBSCRIPTION_CHECK_INTERVAL_MINUTES: i64 = 60;

/// Default HTTP timeout for the translation backend.
pub const LLM_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default timeout for a single live channel-membership check.
pub const MEMBERSHIP_CHECK_TIMEOUT_SECS: u64 = 10;
/// Default lifetime of a resolved channel title/link.
pub const CHANNEL_INFO_CACHE_TTL_SECS: u64 = 3600;

/// Build the layered configuration shared by every settings struct.
///
/// # Errors
///
/// Returns a `ConfigError` if a configuration source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, never checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__XAI_MODEL=grok-3-mini ./target/app`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables map onto snake_case keys; empty ones count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Core settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoreSettings {
    /// API key of the translation backend
    #[serde(default)]
    pub xai_api_key: String,
    /// Chat-completions endpoint of the translation backend
    #[serde(default = "default_xai_api_url")]
    pub xai_api_url: String,
    /// Model requested from the translation backend
    #[serde(default = "default_xai_model")]
    pub xai_model: String,

    /// R2 endpoint URL (persistence connection string)
    pub r2_endpoint_url: Option<String>,
    /// R2 bucket name (persistence database name)
    pub r2_bucket_name: Option<String>,
    /// R2 access key ID
    pub r2_access_key_id: Option<String>,
    /// R2 secret access key
    pub r2_secret_access_key: Option<String>,

    /// Channels a user must be subscribed to, separated by commas
    #[serde(rename = "required_channels")]
    pub required_channels_str: Option<String>,
    /// Minutes a positive subscription check stays valid
    #[serde(default = "default_check_interval")]
    pub subscription_check_interval: i64,
    /// User IDs allowed to run admin commands, separated by commas
    #[serde(rename = "admin_ids")]
    pub admin_ids_str: Option<String>,
}

fn default_xai_api_url() -> String {
    DEFAULT_XAI_API_URL.to_string()
}

fn default_xai_model() -> String {
    DEFAULT_XAI_MODEL.to_string()
}

const fn default_check_interval() -> i64 {
    SUBSCRIPTION_CHECK_INTERVAL_MINUTES
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            xai_api_key: String::new(),
            xai_api_url: default_xai_api_url(),
            xai_model: default_xai_model(),
            r2_endpoint_url: None,
            r2_bucket_name: None,
            r2_access_key_id: None,
            r2_secret_access_key: None,
            required_channels_str: None,
            subscription_check_interval: default_check_interval(),
            admin_ids_str: None,
        }
    }
}

impl CoreSettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the translation API key is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings: Self = build_config()?.try_deserialize()?;

        env_fallback(&mut settings.r2_endpoint_url, "R2_ENDPOINT_URL");
        env_fallback(&mut settings.r2_bucket_name, "R2_BUCKET_NAME");
        env_fallback(&mut settings.r2_access_key_id, "R2_ACCESS_KEY_ID");
        env_fallback(&mut settings.r2_secret_access_key, "R2_SECRET_ACCESS_KEY");

        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings the bot cannot start without.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.xai_api_key.trim().is_empty() {
            return Err(ConfigError::Message("XAI_API_KEY is missing".into()));
        }
        if self.subscription_check_interval < 0 {
            return Err(ConfigError::Message(
                "SUBSCRIPTION_CHECK_INTERVAL must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Returns the channels a user has to join, in configured order.
    ///
    /// An empty list disables the subscription gate.
    #[must_use]
    pub fn required_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::new();
        for token in split_list(self.required_channels_str.as_deref()) {
            if !channels.iter().any(|c| c == token) {
                channels.push(token.to_string());
            }
        }
        channels
    }

    /// Returns the normalized admin allow-list.
    #[must_use]
    pub fn admin_list(&self) -> AdminList {
        AdminList::parse(self.admin_ids_str.as_deref().unwrap_or_default())
    }
}

fn env_fallback(slot: &mut Option<String>, var: &str) {
    if slot.is_some() {
        return;
    }
    if let Ok(val) = std::env::var(var) {
        if !val.is_empty() {
            *slot = Some(val);
        }
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Set of user identifiers permitted to run privileged commands.
///
/// Identifiers are kept in canonical decimal string form so that `"007"`,
/// `"+7"` and `7` all refer to the same user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    ids: HashSet<String>,
}

impl AdminList {
    /// Parse a comma, semicolon or whitespace separated list of user IDs.
    ///
    /// Tokens that are not integers are skipped with a warning.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let ids = split_list(Some(raw))
            .filter_map(|token| match token.parse::<i64>() {
                Ok(id) => Some(id.to_string()),
                Err(_) => {
                    warn!("Ignoring invalid admin id {token:?}");
                    None
                }
            })
            .collect();
        Self { ids }
    }

    /// Whether the user is on the allow-list.
    #[must_use]
    pub fn contains(&self, user_id: i64) -> bool {
        self.ids.contains(&user_id.to_string())
    }

    /// Number of admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nobody can run admin commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Get the translation backend HTTP timeout from env or default.
///
/// Environment variable: `LLM_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_llm_http_timeout_secs() -> u64 {
    std::env::var("LLM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LLM_HTTP_TIMEOUT_SECS)
}

/// Get the per-channel membership check timeout from env or default.
///
/// Environment variable: `MEMBERSHIP_CHECK_TIMEOUT_SECS`.
#[must_use]
pub fn get_membership_check_timeout_secs() -> u64 {
    std::env::var("MEMBERSHIP_CHECK_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(MEMBERSHIP_CHECK_TIMEOUT_SECS)
}

/// Get the channel title cache TTL from env or default.
///
/// Environment variable: `CHANNEL_INFO_CACHE_TTL_SECS`.
#[must_use]
pub fn get_channel_info_cache_ttl_secs() -> u64 {
    std::env::var("CHANNEL_INFO_CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(CHANNEL_INFO_CACHE_TTL_SECS)
}
