use super::*;
use crate::config::AdminList;
use crate::i18n::LANGUAGES;
use crate::llm::{MockTranslator, TranslationError};
use crate::subscription::GateSettings;
use crate::testing::{FakeChannelDirectory, FakeTranslator, InMemoryProfileStore};
use chrono::TimeDelta;
use std::time::Duration;

const USER: i64 = 500;
const ADMIN: i64 = 42;
const CHANNEL: &str = "@ninjanews";

struct Harness {
    dispatcher: UpdateDispatcher,
    store: Arc<InMemoryProfileStore>,
    directory: Arc<FakeChannelDirectory>,
}

fn identity(user_id: i64) -> UserIdentity {
    UserIdentity {
        user_id,
        username: Some("tester".into()),
        first_name: "Test".into(),
        last_name: None,
    }
}

fn harness_with(channels: &[&str], translator: Arc<dyn Translator>) -> Harness {
    let store = Arc::new(InMemoryProfileStore::new());
    let directory = Arc::new(FakeChannelDirectory::new().with_title(
        CHANNEL,
        "Ninja News",
        Some("ninjanews"),
    ));
    let settings = GateSettings {
        channels: channels.iter().map(ToString::to_string).collect(),
        admins: AdminList::parse(&ADMIN.to_string()),
        check_interval: TimeDelta::minutes(60),
        check_timeout: Duration::from_secs(1),
        channel_info_ttl: Duration::from_secs(60),
    };
    let gate = SubscriptionGate::new(settings, directory.clone(), store.clone());
    Harness {
        dispatcher: UpdateDispatcher::new(gate, store.clone(), translator),
        store,
        directory,
    }
}

fn harness(translator: Arc<dyn Translator>) -> Harness {
    harness_with(&[], translator)
}

fn echo() -> Arc<dyn Translator> {
    Arc::new(FakeTranslator::replying("translated"))
}

impl Harness {
    async fn send(&self, inbound: Inbound) -> Vec<Reply> {
        self.dispatcher.handle(&inbound).await
    }

    async fn command(&self, command: BotCommand) -> Vec<Reply> {
        self.send(Inbound::command(identity(USER), command)).await
    }

    async fn press(&self, payload: &str) -> Vec<Reply> {
        self.send(Inbound::callback(identity(USER), payload)).await
    }

    async fn text(&self, text: &str) -> Vec<Reply> {
        self.send(Inbound::text(identity(USER), text)).await
    }

    async fn select(&self, source: &str, target: &str) {
        let pair = TranslationSelection::new(source, target);
        if let Some(pair) = pair {
            self.dispatcher.selections().set(USER, pair).await;
        }
    }
}

fn en(key: MessageKey) -> &'static str {
    get_message(UiLang::En, key)
}

#[tokio::test]
async fn start_creates_profile_and_shows_source_picker() {
    let h = harness(echo());
    assert_eq!(
        h.dispatcher.conversation_state(USER).await,
        ConversationState::NoProfile
    );

    let replies = h.command(BotCommand::Start).await;
    assert_eq!(
        replies,
        vec![Reply::with_keyboard(en(MessageKey::Welcome), source_keyboard())]
    );

    let profile = h.store.profile(USER).await;
    assert_eq!(profile.as_ref().map(|p| p.ui_lang.as_str()), Some("en"));
    assert_eq!(profile.and_then(|p| p.username), Some("tester".into()));
    assert_eq!(
        h.dispatcher.conversation_state(USER).await,
        ConversationState::NeedsSource
    );
}

#[tokio::test]
async fn start_keeps_existing_interface_language() {
    let h = harness(echo());
    h.press("lang_ar").await;

    let replies = h.command(BotCommand::Start).await;
    assert_eq!(
        replies[0].text(),
        Some(get_message(UiLang::Ar, MessageKey::Welcome))
    );
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn source_button_opens_target_picker() {
    let h = harness(echo());
    let replies = h.press("source_en").await;

    assert_eq!(replies.len(), 2);
    let Reply::EditText { text, keyboard, .. } = &replies[0] else {
        panic!("expected an edit, got {replies:?}");
    };
    assert!(text.starts_with("Source language: 🇬🇧 English"));
    assert_eq!(keyboard.as_ref(), Some(&target_keyboard("en")));
    assert_eq!(replies[1], Reply::AnswerCallback);

    assert_eq!(
        h.dispatcher.conversation_state(USER).await,
        ConversationState::NeedsTarget {
            source: "en".into()
        }
    );
}

#[tokio::test]
async fn target_button_stores_selection() {
    let h = harness(echo());
    h.press("source_en").await;
    let replies = h.press("target_en_ar").await;

    assert_eq!(
        replies[0].text().map(|t| t.lines().next().unwrap_or_default()),
        Some("Selected 🇬🇧 English → 🇸🇦 Arabic translation.")
    );
    assert_eq!(replies.last(), Some(&Reply::AnswerCallback));
    assert_eq!(
        h.dispatcher.selections().get(USER).await,
        TranslationSelection::new("en", "ar")
    );
}

#[tokio::test]
async fn confirmation_uses_arabic_names_for_arabic_interface() {
    let h = harness(echo());
    h.press("lang_ar").await;
    let replies = h.press("target_de_fr").await;
    let text = replies[0].text().unwrap_or_default();
    assert!(text.contains("🇩🇪 الألمانية"));
    assert!(text.contains("🇫🇷 الفرنسية"));
}

#[tokio::test]
async fn invalid_pairs_are_only_acknowledged() {
    let h = harness(echo());
    for payload in ["target_en_en", "target_xx_ar", "source_xx", "ignore", "bogus", "lang_fr"] {
        assert_eq!(h.press(payload).await, vec![Reply::AnswerCallback], "{payload}");
    }
    assert_eq!(h.dispatcher.selections().get(USER).await, None);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn interface_language_switch() {
    let h = harness(echo());
    let replies = h.press("lang_ar").await;
    assert_eq!(
        replies,
        vec![
            Reply::EditKeyboard {
                keyboard: ui_language_keyboard(UiLang::Ar)
            },
            Reply::plain(get_message(UiLang::Ar, MessageKey::LanguageSelected)),
            Reply::AnswerCallback,
        ]
    );
    assert_eq!(
        h.store.profile(USER).await.map(|p| p.ui_lang),
        Some("ar".into())
    );

    let replies = h.command(BotCommand::Language).await;
    assert_eq!(
        replies,
        vec![Reply::with_keyboard(
            get_message(UiLang::Ar, MessageKey::LanguageCmd),
            ui_language_keyboard(UiLang::Ar)
        )]
    );
}

#[tokio::test]
async fn interface_language_does_not_touch_direction() {
    let h = harness(echo());
    h.select("es", "it").await;
    h.press("lang_ar").await;
    h.press("lang_en").await;
    assert_eq!(
        h.dispatcher.selections().get(USER).await,
        TranslationSelection::new("es", "it")
    );
}

#[tokio::test]
async fn text_without_selection_asks_for_source() {
    let h = harness(echo());
    let replies = h.text("hello").await;
    assert_eq!(
        replies,
        vec![Reply::with_keyboard(en(MessageKey::SelectFirst), source_keyboard())]
    );

    h.press("source_fr").await;
    let replies = h.text("hello").await;
    assert_eq!(replies[0].keyboard(), Some(&target_keyboard("fr")));
}

#[tokio::test]
async fn text_at_limit_is_translated() {
    let mut translator = MockTranslator::new();
    translator
        .expect_translate()
        .withf(|text, source, target| {
            text.chars().count() == MAX_TEXT_LENGTH && source == "English" && target == "Arabic"
        })
        .times(1)
        .returning(|_, _, _| Ok("ok".to_string()));
    let h = harness(Arc::new(translator));
    h.select("en", "ar").await;

    let replies = h.text(&"ب".repeat(MAX_TEXT_LENGTH)).await;
    assert_eq!(replies, vec![Reply::plain("ok")]);
}

#[tokio::test]
async fn text_over_limit_never_reaches_translator() {
    let mut translator = MockTranslator::new();
    translator.expect_translate().times(0);
    let h = harness(Arc::new(translator));
    h.select("en", "ar").await;

    let replies = h.text(&"a".repeat(MAX_TEXT_LENGTH + 1)).await;
    assert_eq!(replies, vec![Reply::plain(en(MessageKey::TextTooLong))]);
}

#[tokio::test]
async fn translation_failure_shows_generic_error() {
    for error in [
        TranslationError::Network("timeout".into()),
        TranslationError::BadResponse("status 500".into()),
        TranslationError::ParseError("missing key choices".into()),
        TranslationError::Unexpected("Empty response".into()),
    ] {
        let mut translator = MockTranslator::new();
        let mut error = Some(error);
        translator
            .expect_translate()
            .times(1)
            .returning(move |_, _, _| {
                Err(error
                    .take()
                    .unwrap_or(TranslationError::Unexpected(String::new())))
            });
        let h = harness(Arc::new(translator));
        h.select("en", "ar").await;

        assert_eq!(
            h.text("hello").await,
            vec![Reply::plain(en(MessageKey::Error))]
        );
    }
}

#[tokio::test]
async fn stats_only_for_admins() {
    let h = harness(echo());
    assert!(h.command(BotCommand::Stats).await.is_empty());

    h.send(Inbound::command(identity(7), BotCommand::Start)).await;
    h.send(Inbound::callback(identity(8), "lang_ar")).await;

    let replies = h
        .send(Inbound::command(identity(ADMIN), BotCommand::Stats))
        .await;
    assert_eq!(replies.len(), 1);
    let text = replies[0].text().unwrap_or_default();
    assert!(text.contains("Total Users: 2"));
    assert!(text.contains("English UI: 1"));
    assert!(text.contains("Arabic UI: 1"));
    assert!(text.contains("Subscribed Users: 0"));
}

#[tokio::test]
async fn stats_degrade_to_zeros_when_store_fails() {
    let h = harness(echo());
    h.store.set_failing(true);
    let replies = h
        .send(Inbound::command(identity(ADMIN), BotCommand::Stats))
        .await;
    let text = replies[0].text().unwrap_or_default();
    assert!(text.contains("Total Users: 0"));
}

#[tokio::test]
async fn store_failures_fall_back_to_english() {
    let h = harness(echo());
    h.store.set_failing(true);
    let replies = h.command(BotCommand::Language).await;
    assert_eq!(replies[0].text(), Some(en(MessageKey::LanguageCmd)));

    let replies = h.command(BotCommand::Start).await;
    assert_eq!(replies[0].text(), Some(en(MessageKey::Welcome)));
}

#[tokio::test]
async fn gate_denies_before_any_mutation() {
    let h = harness_with(&[CHANNEL], echo());

    let replies = h.press("source_en").await;
    assert_eq!(replies.len(), 2);
    let Reply::Send {
        text,
        format,
        keyboard,
    } = &replies[0]
    else {
        panic!("expected a denial message, got {replies:?}");
    };
    assert_eq!(*format, TextFormat::Html);
    assert!(text.contains("<a href=\"https://t.me/ninjanews\">Ninja News</a>"));
    assert_eq!(keyboard.as_ref(), Some(&subscription_keyboard(UiLang::En)));
    assert_eq!(replies[1], Reply::AnswerCallback);
    assert_eq!(h.dispatcher.selections().entry(USER).await, Default::default());

    for command in [BotCommand::Start, BotCommand::Translate] {
        let replies = h.command(command).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].keyboard(), Some(&subscription_keyboard(UiLang::En)));
    }
    assert!(h.text("hello").await[0]
        .text()
        .is_some_and(|t| t.starts_with("⚠️")));
}

#[tokio::test]
async fn language_switch_is_not_gated() {
    let h = harness_with(&[CHANNEL], echo());
    let replies = h.command(BotCommand::Language).await;
    assert_eq!(replies[0].keyboard(), Some(&ui_language_keyboard(UiLang::En)));
    let replies = h.press("lang_ar").await;
    assert_eq!(replies.len(), 3);
    assert_eq!(h.directory.membership_calls(), 0);
}

#[tokio::test]
async fn admins_bypass_the_gate() {
    let h = harness_with(&[CHANNEL], echo());
    let replies = h
        .send(Inbound::command(identity(ADMIN), BotCommand::Translate))
        .await;
    assert_eq!(
        replies,
        vec![Reply::with_keyboard(en(MessageKey::SelectSource), source_keyboard())]
    );
}

#[tokio::test]
async fn check_subscription_rechecks_live() {
    let h = harness_with(&[CHANNEL], echo());

    let replies = h.press("check_subscription").await;
    let Reply::EditText { text, format, .. } = &replies[0] else {
        panic!("expected an edit, got {replies:?}");
    };
    assert!(text.starts_with("❌"));
    assert_eq!(*format, TextFormat::Html);
    assert_eq!(replies.last(), Some(&Reply::AnswerCallback));

    h.directory.join(CHANNEL, USER).await;
    let replies = h.press("check_subscription").await;
    assert_eq!(
        replies,
        vec![
            Reply::EditText {
                text: en(MessageKey::SubscriptionVerified).to_string(),
                format: TextFormat::Plain,
                keyboard: None,
            },
            Reply::with_keyboard(en(MessageKey::SelectSource), source_keyboard()),
            Reply::AnswerCallback,
        ]
    );
    let calls = h.directory.membership_calls();

    // A fresh positive check is served from the profile
    h.command(BotCommand::Translate).await;
    assert_eq!(h.directory.membership_calls(), calls);
    assert_eq!(
        h.store.profile(USER).await.map(|p| p.subscription_verified),
        Some(true)
    );
}

#[tokio::test]
async fn every_callback_is_answered_exactly_once() {
    let h = harness_with(&[CHANNEL], echo());
    let mut payloads: Vec<String> = LANGUAGES
        .iter()
        .map(|lang| format!("source_{}", lang.code))
        .collect();
    payloads.extend(
        ["ignore", "lang_en", "check_subscription", "target_en_ar", "x"].map(String::from),
    );

    for payload in payloads {
        let replies = h.press(&payload).await;
        let answers = replies
            .iter()
            .filter(|r| matches!(r, Reply::AnswerCallback))
            .count();
        assert_eq!(answers, 1, "{payload}");
        assert_eq!(replies.last(), Some(&Reply::AnswerCallback), "{payload}");
    }
}

#[tokio::test]
async fn long_translation_is_split_into_several_messages() {
    let translated: String = (0..150)
        .map(|i| format!("Line {i:03} of a translation that grew a lot longer than its source.\n"))
        .collect();
    assert!(translated.chars().count() > 4096);
    let h = harness(Arc::new(FakeTranslator::replying(translated.clone())));
    h.select("zh", "en").await;

    let replies = h.text(&"中".repeat(MAX_TEXT_LENGTH)).await;

    assert!(replies.len() > 1);
    let mut joined = String::new();
    for reply in &replies {
        let Reply::Send { text, keyboard, .. } = reply else {
            panic!("expected plain sends, got {reply:?}");
        };
        assert!(text.chars().count() <= MESSAGE_CHAR_LIMIT);
        assert!(keyboard.is_none());
        joined.push_str(text);
    }
    assert_eq!(joined, translated);
}

#[tokio::test]
async fn unreachable_channel_counts_as_missing() {
    const BACKUP: &str = "@ninjabackup";
    let h = harness_with(&[CHANNEL, BACKUP], echo());
    h.directory.join(CHANNEL, USER).await;
    h.directory.join(BACKUP, USER).await;
    h.directory.break_channel(BACKUP).await;

    let replies = h.command(BotCommand::Translate).await;
    let text = replies[0].text().unwrap_or_default();
    assert!(text.starts_with("⚠️"));
    // The unresolved channel still gets a link built from its @name
    assert!(text.contains("<a href=\"https://t.me/ninjabackup\">@ninjabackup</a>"));
    assert_eq!(
        h.store.profile(USER).await.map(|p| p.subscription_verified),
        Some(false)
    );
}

#[tokio::test]
async fn leaving_a_channel_is_noticed_on_recheck() {
    let h = harness_with(&[CHANNEL], echo());
    h.directory.join(CHANNEL, USER).await;
    let replies = h.press("check_subscription").await;
    assert_eq!(
        replies[0].text(),
        Some(en(MessageKey::SubscriptionVerified))
    );

    h.directory.leave(CHANNEL, USER).await;
    let replies = h.press("check_subscription").await;
    assert!(replies[0].text().is_some_and(|t| t.starts_with("❌")));
    assert_eq!(
        h.store.profile(USER).await.map(|p| p.subscription_verified),
        Some(false)
    );
}

#[tokio::test]
async fn expired_verification_triggers_live_check() {
    let h = harness_with(&[CHANNEL], echo());
    let checked = chrono::Utc::now() - TimeDelta::minutes(61);
    let mut profile = UserProfile::new(USER, checked);
    profile.subscription_verified = true;
    profile.subscription_last_checked = Some(checked);
    h.store.insert(profile).await;

    let replies = h.command(BotCommand::Translate).await;

    assert_eq!(h.directory.membership_calls(), 1);
    assert!(replies[0].text().is_some_and(|t| t.starts_with("⚠️")));
}
