//! Update dispatcher
//!
//! Maps every inbound update to the ordered list of replies the transport
//! must perform. The subscription gate runs once, up front, for every
//! gated action; the handlers behind it never re-check.

mod inbound;
mod keyboards;
mod reply;
mod state;

#[cfg(test)]
mod tests;

pub use inbound::{BotCommand, CallbackAction, Inbound, InboundEvent};
pub use keyboards::{source_keyboard, subscription_keyboard, target_keyboard, ui_language_keyboard};
pub use reply::{split_long_text, Button, Keyboard, Reply, TextFormat, MESSAGE_CHAR_LIMIT};
pub use state::ConversationState;

use crate::config::MAX_TEXT_LENGTH;
use crate::i18n::{
    find_language, format_message, get_message, localized_display, MessageKey, UiLang,
};
use crate::llm::Translator;
use crate::selection::{SelectionStore, TranslationSelection};
use crate::storage::{ProfileStore, UsageStats, UserIdentity, UserProfile};
use crate::subscription::{render_channel_links, AccessDecision, ChannelLink, SubscriptionGate};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Decision core of the bot.
pub struct UpdateDispatcher {
    gate: SubscriptionGate,
    store: Arc<dyn ProfileStore>,
    translator: Arc<dyn Translator>,
    selections: SelectionStore,
}

impl UpdateDispatcher {
    /// Create a dispatcher with an empty selection store.
    #[must_use]
    pub fn new(
        gate: SubscriptionGate,
        store: Arc<dyn ProfileStore>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            gate,
            store,
            translator,
            selections: SelectionStore::new(),
        }
    }

    /// The in-memory translation directions.
    #[must_use]
    pub const fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    /// Route one update. Never fails: every error degrades into a reply or silence.
    pub async fn handle(&self, inbound: &Inbound) -> Vec<Reply> {
        let user = &inbound.user;
        debug!(user_id = user.user_id, event = ?inbound.event, "Inbound update");

        match &inbound.event {
            InboundEvent::Command(command) => self.handle_command(user, *command).await,
            InboundEvent::Callback(payload) => {
                let mut replies = self.handle_callback(user, payload).await;
                replies.push(Reply::AnswerCallback);
                replies
            }
            InboundEvent::Text(text) => self.handle_text(user, text).await,
        }
    }

    /// Current position of the user in the translation flow.
    pub async fn conversation_state(&self, user_id: i64) -> ConversationState {
        let has_profile = self.profile(user_id).await.is_some();
        ConversationState::derive(has_profile, self.selections.entry(user_id).await)
    }

    async fn handle_command(&self, user: &UserIdentity, command: BotCommand) -> Vec<Reply> {
        let ui = self.ui_lang(user.user_id).await;
        match command {
            BotCommand::Start => self.start(user, ui).await,
            BotCommand::Language => vec![Reply::with_keyboard(
                get_message(ui, MessageKey::LanguageCmd),
                ui_language_keyboard(ui),
            )],
            BotCommand::Translate => {
                if let Some(denied) = self.guard(user.user_id, ui).await {
                    return denied;
                }
                vec![Reply::with_keyboard(
                    get_message(ui, MessageKey::SelectSource),
                    source_keyboard(),
                )]
            }
            BotCommand::Stats => self.stats(user.user_id, ui).await,
        }
    }

    async fn handle_callback(&self, user: &UserIdentity, payload: &str) -> Vec<Reply> {
        let user_id = user.user_id;
        let action = CallbackAction::parse(payload);

        match &action {
            CallbackAction::Ignore => return Vec::new(),
            CallbackAction::Unknown(payload) => {
                debug!(user_id, payload = %payload, "Ignoring unknown callback payload");
                return Vec::new();
            }
            CallbackAction::UiLang(code) => return self.switch_ui_lang(user_id, code).await,
            CallbackAction::CheckSubscription => {
                let ui = self.ui_lang(user_id).await;
                return self.recheck_subscription(user_id, ui).await;
            }
            CallbackAction::Source(_) | CallbackAction::Target { .. } => {}
        }

        let ui = self.ui_lang(user_id).await;
        if let Some(denied) = self.guard(user_id, ui).await {
            return denied;
        }

        match action {
            CallbackAction::Source(code) => self.choose_source(user_id, ui, &code).await,
            CallbackAction::Target { source, target } => {
                self.choose_target(user_id, ui, &source, &target).await
            }
            _ => Vec::new(),
        }
    }

    async fn handle_text(&self, user: &UserIdentity, text: &str) -> Vec<Reply> {
        let user_id = user.user_id;
        let ui = self.ui_lang(user_id).await;
        if let Some(denied) = self.guard(user_id, ui).await {
            return denied;
        }

        match self.conversation_state(user_id).await {
            ConversationState::Ready(selection) => {
                self.translate(user_id, ui, text, &selection).await
            }
            ConversationState::NeedsTarget { source } => vec![Reply::with_keyboard(
                get_message(ui, MessageKey::SelectFirst),
                target_keyboard(&source),
            )],
            ConversationState::NeedsSource | ConversationState::NoProfile => {
                vec![Reply::with_keyboard(
                    get_message(ui, MessageKey::SelectFirst),
                    source_keyboard(),
                )]
            }
        }
    }

    async fn start(&self, user: &UserIdentity, ui: UiLang) -> Vec<Reply> {
        if let Some(denied) = self.guard(user.user_id, ui).await {
            return denied;
        }

        let ui = match self.store.upsert_identity(user.clone()).await {
            Ok(profile) => profile.ui(),
            Err(e) => {
                error!(user_id = user.user_id, "Failed to save profile: {e}");
                ui
            }
        };

        vec![Reply::with_keyboard(
            get_message(ui, MessageKey::Welcome),
            source_keyboard(),
        )]
    }

    async fn stats(&self, user_id: i64, ui: UiLang) -> Vec<Reply> {
        if !self.gate.is_admin(user_id) {
            debug!(user_id, "Ignoring /stats from non-admin");
            return Vec::new();
        }

        let stats = self.store.stats().await.unwrap_or_else(|e| {
            error!("Failed to collect statistics: {e}");
            UsageStats::default()
        });
        let (total, english, arabic, subscribed) = (
            stats.total.to_string(),
            stats.english_ui.to_string(),
            stats.arabic_ui.to_string(),
            stats.subscribed.to_string(),
        );
        vec![Reply::plain(format_message(
            ui,
            MessageKey::Stats,
            &[
                ("total_users", total.as_str()),
                ("english_ui", english.as_str()),
                ("arabic_ui", arabic.as_str()),
                ("subscribed_users", subscribed.as_str()),
            ],
        ))]
    }

    async fn switch_ui_lang(&self, user_id: i64, code: &str) -> Vec<Reply> {
        let Some(lang) = UiLang::from_code(code) else {
            debug!(user_id, code, "Ignoring unsupported interface language");
            return Vec::new();
        };

        if let Err(e) = self.store.set_ui_lang(user_id, lang).await {
            error!(user_id, "Failed to save interface language: {e}");
        }

        vec![
            Reply::EditKeyboard {
                keyboard: ui_language_keyboard(lang),
            },
            Reply::plain(get_message(lang, MessageKey::LanguageSelected)),
        ]
    }

    async fn recheck_subscription(&self, user_id: i64, ui: UiLang) -> Vec<Reply> {
        match self.gate.recheck(user_id).await {
            AccessDecision::Allowed => vec![
                Reply::EditText {
                    text: get_message(ui, MessageKey::SubscriptionVerified).to_string(),
                    format: TextFormat::Plain,
                    keyboard: None,
                },
                Reply::with_keyboard(get_message(ui, MessageKey::SelectSource), source_keyboard()),
            ],
            AccessDecision::Denied(links) => vec![Reply::EditText {
                text: channel_message(ui, MessageKey::SubscriptionNotVerified, &links),
                format: TextFormat::Html,
                keyboard: Some(subscription_keyboard(ui)),
            }],
        }
    }

    async fn choose_source(&self, user_id: i64, ui: UiLang, code: &str) -> Vec<Reply> {
        if find_language(code).is_none() {
            debug!(user_id, code, "Ignoring unknown source language");
            return Vec::new();
        }

        self.selections.set_pending(user_id, code).await;
        let source_lang = localized_display(ui, code);
        vec![Reply::EditText {
            text: format_message(
                ui,
                MessageKey::SelectedSource,
                &[("source_lang", source_lang.as_str())],
            ),
            format: TextFormat::Plain,
            keyboard: Some(target_keyboard(code)),
        }]
    }

    async fn choose_target(
        &self,
        user_id: i64,
        ui: UiLang,
        source: &str,
        target: &str,
    ) -> Vec<Reply> {
        let known = find_language(source).is_some() && find_language(target).is_some();
        let selection = TranslationSelection::new(source, target).filter(|_| known);
        let Some(selection) = selection else {
            debug!(user_id, source, target, "Ignoring invalid language pair");
            return Vec::new();
        };

        self.selections.set(user_id, selection).await;
        info!(user_id, source, target, "Translation direction selected");

        let from_lang = localized_display(ui, source);
        let to_lang = localized_display(ui, target);
        vec![Reply::EditText {
            text: format_message(
                ui,
                MessageKey::Selected,
                &[("from_lang", from_lang.as_str()), ("to_lang", to_lang.as_str())],
            ),
            format: TextFormat::Plain,
            keyboard: None,
        }]
    }

    async fn translate(
        &self,
        user_id: i64,
        ui: UiLang,
        text: &str,
        selection: &TranslationSelection,
    ) -> Vec<Reply> {
        if text.chars().count() > MAX_TEXT_LENGTH {
            return vec![Reply::plain(get_message(ui, MessageKey::TextTooLong))];
        }

        let source = bare_language_name(&selection.source);
        let target = bare_language_name(&selection.target);
        match self.translator.translate(text, source, target).await {
            Ok(translated) => split_long_text(&translated, MESSAGE_CHAR_LIMIT)
                .into_iter()
                .map(Reply::plain)
                .collect(),
            Err(e) => {
                error!(user_id, reason = e.reason(), "Translation failed: {e}");
                vec![Reply::plain(get_message(ui, MessageKey::Error))]
            }
        }
    }

    /// `Some(replies)` when the gate denies the user.
    async fn guard(&self, user_id: i64, ui: UiLang) -> Option<Vec<Reply>> {
        match self.gate.check_access(user_id).await {
            AccessDecision::Allowed => None,
            AccessDecision::Denied(links) => Some(vec![Reply::Send {
                text: channel_message(ui, MessageKey::SubscriptionRequired, &links),
                format: TextFormat::Html,
                keyboard: Some(subscription_keyboard(ui)),
            }]),
        }
    }

    async fn profile(&self, user_id: i64) -> Option<UserProfile> {
        self.store.get_profile(user_id).await.unwrap_or_else(|e| {
            error!(user_id, "Profile lookup failed, treating as not found: {e}");
            None
        })
    }

    async fn ui_lang(&self, user_id: i64) -> UiLang {
        self.profile(user_id)
            .await
            .map(|profile| profile.ui())
            .unwrap_or_default()
    }
}

fn bare_language_name(code: &str) -> &str {
    find_language(code).map_or(code, |lang| lang.bare_name())
}

fn channel_message(ui: UiLang, key: MessageKey, links: &[ChannelLink]) -> String {
    let rendered = render_channel_links(links);
    format_message(ui, key, &[("channel_links", rendered.as_str())])
}
