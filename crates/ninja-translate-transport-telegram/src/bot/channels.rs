//! Channel membership through the Bot API.
//!
//! The bot must be an administrator of every private channel it checks;
//! otherwise `getChatMember` fails and the gate counts the user as absent.

use async_trait::async_trait;
use ninja_translate_core::subscription::{ChannelDirectory, ChannelInfo, MembershipError};
use teloxide::prelude::*;
use teloxide::types::{ChatMemberStatus, Recipient, UserId};

/// [`ChannelDirectory`] backed by `getChatMember` and `getChat`.
pub struct TelegramChannelDirectory {
    bot: Bot,
}

impl TelegramChannelDirectory {
    /// Create a directory using the bot's credentials.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Numeric ids address chats directly; anything else is a public username.
#[must_use]
pub fn recipient(channel: &str) -> Recipient {
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel.starts_with('@') => Recipient::ChannelUsername(channel.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel}")),
    }
}

/// Statuses that count as subscribed.
#[must_use]
pub const fn is_subscribed(status: ChatMemberStatus) -> bool {
    matches!(
        status,
        ChatMemberStatus::Owner | ChatMemberStatus::Administrator | ChatMemberStatus::Member
    )
}

#[async_trait]
impl ChannelDirectory for TelegramChannelDirectory {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, MembershipError> {
        let user = u64::try_from(user_id)
            .map(UserId)
            .map_err(|_| MembershipError::Api(format!("invalid user id {user_id}")))?;

        let member = self
            .bot
            .get_chat_member(recipient(channel), user)
            .await
            .map_err(|e| MembershipError::Api(e.to_string()))?;

        Ok(is_subscribed(member.kind.status()))
    }

    async fn describe(&self, channel: &str) -> Result<ChannelInfo, MembershipError> {
        let chat = self
            .bot
            .get_chat(recipient(channel))
            .await
            .map_err(|e| MembershipError::Api(e.to_string()))?;

        Ok(ChannelInfo {
            title: chat.title().map(ToString::to_string),
            username: chat.username().map(ToString::to_string),
        })
    }
}
