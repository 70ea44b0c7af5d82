//! Platform-neutral description of an incoming update.

use crate::storage::UserIdentity;

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `/start`
    Start,
    /// `/language`, `/lang`
    Language,
    /// `/translate`, `/tr`
    Translate,
    /// `/stats` (admins only)
    Stats,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A recognized command
    Command(BotCommand),
    /// A button press carrying its payload
    Callback(String),
    /// Any other text message
    Text(String),
}

/// One incoming update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Who sent it
    pub user: UserIdentity,
    /// What it contains
    pub event: InboundEvent,
}

impl Inbound {
    /// Shorthand for a command update.
    #[must_use]
    pub fn command(user: UserIdentity, command: BotCommand) -> Self {
        Self {
            user,
            event: InboundEvent::Command(command),
        }
    }

    /// Shorthand for a button press.
    #[must_use]
    pub fn callback(user: UserIdentity, payload: impl Into<String>) -> Self {
        Self {
            user,
            event: InboundEvent::Callback(payload.into()),
        }
    }

    /// Shorthand for a text message.
    #[must_use]
    pub fn text(user: UserIdentity, text: impl Into<String>) -> Self {
        Self {
            user,
            event: InboundEvent::Text(text.into()),
        }
    }
}

/// Button payload, routed by its namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `lang_<code>`: switch the interface language
    UiLang(String),
    /// `source_<code>`: first step of the direction picker
    Source(String),
    /// `target_<source>_<target>`: second step of the direction picker
    Target {
        /// Source code carried over from the first step
        source: String,
        /// Chosen target code
        target: String,
    },
    /// `check_subscription`: live membership re-check
    CheckSubscription,
    /// `ignore`: title buttons
    Ignore,
    /// Anything else
    Unknown(String),
}

impl CallbackAction {
    /// Classify a raw payload. Never fails; unknown payloads map to [`CallbackAction::Unknown`].
    #[must_use]
    pub fn parse(payload: &str) -> Self {
        match payload {
            "check_subscription" => return Self::CheckSubscription,
            "ignore" => return Self::Ignore,
            _ => {}
        }

        if let Some(code) = payload.strip_prefix("lang_") {
            return Self::UiLang(code.to_string());
        }
        if let Some(code) = payload.strip_prefix("source_") {
            return Self::Source(code.to_string());
        }
        if let Some((source, target)) = payload
            .strip_prefix("target_")
            .and_then(|rest| rest.split_once('_'))
        {
            return Self::Target {
                source: source.to_string(),
                target: target.to_string(),
            };
        }
        Self::Unknown(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_routing() {
        assert_eq!(CallbackAction::parse("lang_ar"), CallbackAction::UiLang("ar".into()));
        assert_eq!(CallbackAction::parse("source_en"), CallbackAction::Source("en".into()));
        assert_eq!(
            CallbackAction::parse("target_en_ar"),
            CallbackAction::Target {
                source: "en".into(),
                target: "ar".into()
            }
        );
        assert_eq!(
            CallbackAction::parse("check_subscription"),
            CallbackAction::CheckSubscription
        );
        assert_eq!(CallbackAction::parse("ignore"), CallbackAction::Ignore);
    }

    #[test]
    fn test_malformed_payloads_are_unknown() {
        assert_eq!(
            CallbackAction::parse("target_en"),
            CallbackAction::Unknown("target_en".into())
        );
        assert_eq!(CallbackAction::parse(""), CallbackAction::Unknown(String::new()));
        assert_eq!(
            CallbackAction::parse("en_ar"),
            CallbackAction::Unknown("en_ar".into())
        );
    }
}
