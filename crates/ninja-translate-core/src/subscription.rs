//! Channel-membership gate
//!
//! Decides whether a user may use the bot. A positive membership check is
//! remembered in the user's profile and trusted until the re-check interval
//! elapses; after that every configured channel is asked again.

use crate::config::{
    get_channel_info_cache_ttl_secs, get_membership_check_timeout_secs, AdminList, CoreSettings,
};
use crate::storage::ProfileStore;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::join_all;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failure of a platform call made on behalf of the gate.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// The platform rejected the call (unknown channel, bot not admin, ...)
    #[error("Platform API error: {0}")]
    Api(String),
    /// The call did not finish in time
    #[error("Membership check timed out")]
    Timeout,
}

/// Publicly known details of a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel title
    pub title: Option<String>,
    /// Public username, without the leading `@`
    pub username: Option<String>,
}

/// Source of channel membership and channel details
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Whether the user currently is a member, administrator or creator of the channel.
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, MembershipError>;
    /// Resolve title and username of a configured channel.
    async fn describe(&self, channel: &str) -> Result<ChannelInfo, MembershipError>;
}

/// A required channel as presented to a denied user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLink {
    /// Identifier from configuration
    pub channel: String,
    /// Human-readable name, the identifier when unresolved
    pub title: String,
    /// Public link, when the channel has a username
    pub url: Option<String>,
}

impl ChannelLink {
    fn resolve(channel: &str, info: Option<ChannelInfo>) -> Self {
        let info = info.unwrap_or_default();
        let username = info
            .username
            .or_else(|| channel.strip_prefix('@').map(ToString::to_string));
        Self {
            channel: channel.to_string(),
            title: info.title.unwrap_or_else(|| channel.to_string()),
            url: username.map(|name| format!("https://t.me/{name}")),
        }
    }
}

/// Render channel links as an HTML bullet list.
#[must_use]
pub fn render_channel_links(links: &[ChannelLink]) -> String {
    links
        .iter()
        .map(|link| {
            let title = html_escape::encode_text(&link.title);
            match &link.url {
                Some(url) => format!(
                    "• <a href=\"{}\">{title}</a>",
                    html_escape::encode_double_quoted_attribute(url)
                ),
                None => format!("• {title}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The user may proceed
    Allowed,
    /// The user must join these channels first
    Denied(Vec<ChannelLink>),
}

impl AccessDecision {
    /// True for [`AccessDecision::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Static parameters of the gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    /// Channels the user must belong to; empty disables the gate
    pub channels: Vec<String>,
    /// Users that bypass the gate
    pub admins: AdminList,
    /// How long a positive check stays valid
    pub check_interval: TimeDelta,
    /// Upper bound for one live membership call
    pub check_timeout: Duration,
    /// Lifetime of resolved channel titles
    pub channel_info_ttl: Duration,
}

impl GateSettings {
    /// Derive gate parameters from core settings and tunables.
    #[must_use]
    pub fn from_core(settings: &CoreSettings) -> Self {
        Self {
            channels: settings.required_channels(),
            admins: settings.admin_list(),
            check_interval: TimeDelta::try_minutes(settings.subscription_check_interval)
                .unwrap_or(TimeDelta::MAX),
            check_timeout: Duration::from_secs(get_membership_check_timeout_secs()),
            channel_info_ttl: Duration::from_secs(get_channel_info_cache_ttl_secs()),
        }
    }
}

/// Access control in front of every gated bot function.
pub struct SubscriptionGate {
    settings: GateSettings,
    directory: Arc<dyn ChannelDirectory>,
    store: Arc<dyn ProfileStore>,
    channel_info: Cache<String, ChannelLink>,
}

impl SubscriptionGate {
    /// Create a gate over a channel directory and the profile store.
    #[must_use]
    pub fn new(
        settings: GateSettings,
        directory: Arc<dyn ChannelDirectory>,
        store: Arc<dyn ProfileStore>,
    ) -> Self {
        let channel_info = Cache::builder()
            .max_capacity(256)
            .time_to_live(settings.channel_info_ttl)
            .build();
        Self {
            settings,
            directory,
            store,
            channel_info,
        }
    }

    /// False when no channels are configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.settings.channels.is_empty()
    }

    /// Whether the user is on the admin allow-list.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.settings.admins.contains(user_id)
    }

    /// Decide access for the user as of now.
    pub async fn check_access(&self, user_id: i64) -> AccessDecision {
        self.check_access_at(user_id, Utc::now()).await
    }

    /// Decide access for the user as of `now`.
    ///
    /// A cached positive result is trusted while `now - last_checked` is
    /// strictly below the re-check interval.
    pub async fn check_access_at(&self, user_id: i64, now: DateTime<Utc>) -> AccessDecision {
        if !self.is_enabled() || self.is_admin(user_id) {
            return AccessDecision::Allowed;
        }

        let profile = match self.store.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!(user_id, "Profile lookup failed, treating as not found: {e}");
                None
            }
        };

        let cached = profile.as_ref().and_then(|p| {
            p.subscription_verified
                .then_some(p.subscription_last_checked)
                .flatten()
        });
        if let Some(last_checked) = cached {
            if now - last_checked < self.settings.check_interval {
                debug!(user_id, "Subscription cache hit");
                return AccessDecision::Allowed;
            }
        }

        self.live_check(user_id, now).await
    }

    /// Ask every channel again, ignoring any cached result.
    pub async fn recheck(&self, user_id: i64) -> AccessDecision {
        if !self.is_enabled() || self.is_admin(user_id) {
            return AccessDecision::Allowed;
        }
        self.live_check(user_id, Utc::now()).await
    }

    /// Display details of every required channel.
    pub async fn channel_links(&self) -> Vec<ChannelLink> {
        join_all(self.settings.channels.iter().map(|c| self.channel_link(c))).await
    }

    async fn live_check(&self, user_id: i64, now: DateTime<Utc>) -> AccessDecision {
        let results = join_all(
            self.settings
                .channels
                .iter()
                .map(|channel| self.check_channel(channel, user_id)),
        )
        .await;
        let verified = results.into_iter().all(|member| member);

        if let Err(e) = self
            .store
            .record_subscription_check(user_id, verified, now)
            .await
        {
            error!(user_id, "Failed to persist subscription check: {e}");
        }

        if verified {
            info!(user_id, "Subscription verified");
            AccessDecision::Allowed
        } else {
            info!(user_id, "Subscription missing, access denied");
            AccessDecision::Denied(self.channel_links().await)
        }
    }

    async fn check_channel(&self, channel: &str, user_id: i64) -> bool {
        let result = tokio::time::timeout(
            self.settings.check_timeout,
            self.directory.is_member(channel, user_id),
        )
        .await
        .unwrap_or(Err(MembershipError::Timeout));

        match result {
            Ok(member) => member,
            Err(e) => {
                warn!(user_id, channel, "Membership check failed, counting as non-member: {e}");
                false
            }
        }
    }

    async fn channel_link(&self, channel: &str) -> ChannelLink {
        if let Some(link) = self.channel_info.get(channel).await {
            return link;
        }

        let lookup = tokio::time::timeout(
            self.settings.check_timeout,
            self.directory.describe(channel),
        )
        .await
        .unwrap_or(Err(MembershipError::Timeout));

        match lookup {
            Ok(info) => {
                let link = ChannelLink::resolve(channel, Some(info));
                self.channel_info
                    .insert(channel.to_string(), link.clone())
                    .await;
                link
            }
            Err(e) => {
                // Not cached so the next denial retries the lookup
                warn!(channel, "Channel lookup failed: {e}");
                ChannelLink::resolve(channel, None)
            }
        }
    }
}
