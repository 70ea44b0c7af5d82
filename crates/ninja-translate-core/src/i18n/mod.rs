//! Localized bot replies and the language catalog.
//!
//! Lookups fall back from the requested UI language to English, and for
//! language names further to the raw code. Templates use `{name}`
//! placeholders filled by [`format_message`].

mod languages;
mod messages;


pub use languages::{
    bare_name, find_language, localized_display, ui_language_name, Language, LANGUAGES,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Language of the bot interface, independent of the translation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiLang {
    /// English (fallback)
    #[default]
    En,
    /// Arabic
    Ar,
}

impl UiLang {
    /// Every supported interface language, in keyboard order.
    pub const ALL: [Self; 2] = [Self::En, Self::Ar];

    /// Two-letter code as stored in profiles and callback payloads.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Flag shown next to the language on the interface keyboard.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::En => "🇬🇧",
            Self::Ar => "🇸🇦",
        }
    }

    /// Parse a supported code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::En),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    /// Parse a code, falling back to English for anything unsupported.
    #[must_use]
    pub fn resolve(code: &str) -> Self {
        Self::from_code(code).unwrap_or_default()
    }
}

/// Identifier of a localized reply template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Greeting shown on `/start`
    Welcome,
    /// Confirmation after a complete language pair was chosen
    Selected,
    /// Prompt for the target language after a source was chosen
    SelectedSource,
    /// Prompt for the source language
    SelectSource,
    /// Free text arrived before a language pair was chosen
    SelectFirst,
    /// Input exceeds the length limit
    TextTooLong,
    /// Generic translation failure
    Error,
    /// Prompt for the interface language
    LanguageCmd,
    /// Confirmation of an interface language change
    LanguageSelected,
    /// Admin statistics
    Stats,
    /// Gate denied access
    SubscriptionRequired,
    /// Label of the "check subscription" button
    SubscriptionCheck,
    /// Live re-check succeeded
    SubscriptionVerified,
    /// Live re-check failed
    SubscriptionNotVerified,
}

impl MessageKey {
    /// Every template key.
    pub const ALL: [Self; 14] = [
        Self::Welcome,
        Self::Selected,
        Self::SelectedSource,
        Self::SelectSource,
        Self::SelectFirst,
        Self::TextTooLong,
        Self::Error,
        Self::LanguageCmd,
        Self::LanguageSelected,
        Self::Stats,
        Self::SubscriptionRequired,
        Self::SubscriptionCheck,
        Self::SubscriptionVerified,
        Self::SubscriptionNotVerified,
    ];

    /// Placeholders the template expects to be filled.
    #[must_use]
    pub const fn placeholders(self) -> &'static [&'static str] {
        match self {
            Self::Selected => &["from_lang", "to_lang"],
            Self::SelectedSource => &["source_lang"],
            Self::Stats => &["total_users", "english_ui", "arabic_ui", "subscribed_users"],
            Self::SubscriptionRequired | Self::SubscriptionNotVerified => &["channel_links"],
            _ => &[],
        }
    }
}

/// Return the raw template for `key` in `lang`, falling back to English.
#[must_use]
pub fn get_message(lang: UiLang, key: MessageKey) -> &'static str {
    messages::lookup(lang, key)
        .or_else(|| messages::lookup(UiLang::En, key))
        .unwrap_or_default()
}

/// Render the template for `key` with named `params`.
///
/// A template placeholder without a matching parameter is a programming
/// error: it panics in debug builds and is logged in release builds.
#[must_use]
pub fn format_message(lang: UiLang, key: MessageKey, params: &[(&str, &str)]) -> String {
    let missing: Vec<&str> = key
        .placeholders()
        .iter()
        .copied()
        .filter(|name| !params.iter().any(|(param, _)| param == name))
        .collect();
    debug_assert!(
        missing.is_empty(),
        "message {key:?} rendered without placeholders {missing:?}"
    );
    if !missing.is_empty() {
        warn!("Message {key:?} rendered without placeholders {missing:?}");
    }

    let mut rendered = get_message(lang, key).to_string();
    for (name, value) in params {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}
