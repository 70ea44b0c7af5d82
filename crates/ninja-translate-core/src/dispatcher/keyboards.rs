//! Inline keyboards shown by the bot.

use super::reply::{Button, Keyboard};
use crate::i18n::{get_message, ui_language_name, Language, MessageKey, UiLang, LANGUAGES};

const SOURCE_TITLE: &str = "🌍 SELECT SOURCE LANGUAGE 🌍";
const TARGET_TITLE: &str = "🎯 SELECT TARGET LANGUAGE 🎯";
const IGNORE_PAYLOAD: &str = "ignore";
const LANGUAGES_PER_ROW: usize = 2;

fn picker<'a>(
    title: &str,
    languages: impl Iterator<Item = &'a Language>,
    payload: impl Fn(&Language) -> String,
) -> Keyboard {
    let buttons: Vec<Button> = languages
        .map(|lang| Button::new(lang.display, payload(lang)))
        .collect();

    let mut rows = vec![vec![Button::new(title, IGNORE_PAYLOAD)]];
    rows.extend(buttons.chunks(LANGUAGES_PER_ROW).map(<[Button]>::to_vec));
    Keyboard { rows }
}

/// Source picker: a title row, then every catalog language.
#[must_use]
pub fn source_keyboard() -> Keyboard {
    picker(SOURCE_TITLE, LANGUAGES.iter(), |lang| {
        format!("source_{}", lang.code)
    })
}

/// Target picker: every catalog language except `source`.
#[must_use]
pub fn target_keyboard(source: &str) -> Keyboard {
    picker(
        TARGET_TITLE,
        LANGUAGES.iter().filter(|lang| lang.code != source),
        |lang| format!("target_{source}_{}", lang.code),
    )
}

/// Interface-language picker with the current choice ticked.
#[must_use]
pub fn ui_language_keyboard(current: UiLang) -> Keyboard {
    let buttons = UiLang::ALL
        .into_iter()
        .map(|lang| {
            let name = ui_language_name(current, lang.code());
            let label = if lang == current {
                format!("{} ✅ {name}", lang.flag())
            } else {
                format!("{} {name}", lang.flag())
            };
            Button::new(label, format!("lang_{}", lang.code()))
        })
        .collect();
    Keyboard {
        rows: vec![buttons],
    }
}

/// Single "check subscription" button.
#[must_use]
pub fn subscription_keyboard(ui: UiLang) -> Keyboard {
    Keyboard {
        rows: vec![vec![Button::new(
            get_message(ui, MessageKey::SubscriptionCheck),
            "check_subscription",
        )]],
    }
}
