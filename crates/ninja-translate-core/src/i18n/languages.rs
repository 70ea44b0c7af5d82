//! Catalog of languages offered for translation.

use super::UiLang;

/// A selectable translation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Short code used in callback payloads
    pub code: &'static str,
    /// English display name with a leading flag glyph
    pub display: &'static str,
}

impl Language {
    /// Display name without the flag, as sent to the translation backend.
    #[must_use]
    pub fn bare_name(&self) -> &'static str {
        bare_name(self.display)
    }
}

const fn lang(code: &'static str, display: &'static str) -> Language {
    Language { code, display }
}

/// Supported translation languages in keyboard order.
pub const LANGUAGES: &[Language] = &[
    lang("en", "🇬🇧 English"),
    lang("ar", "🇸🇦 Arabic"),
    lang("es", "🇪🇸 Spanish"),
    lang("fr", "🇫🇷 French"),
    lang("de", "🇩🇪 German"),
    lang("zh", "🇨🇳 Chinese"),
    lang("ru", "🇷🇺 Russian"),
    lang("pt", "🇵🇹 Portuguese"),
    lang("ja", "🇯🇵 Japanese"),
    lang("it", "🇮🇹 Italian"),
    lang("ko", "🇰🇷 Korean"),
    lang("tr", "🇹🇷 Turkish"),
    lang("nl", "🇳🇱 Dutch"),
    lang("sv", "🇸🇪 Swedish"),
    lang("pl", "🇵🇱 Polish"),
    lang("vi", "🇻🇳 Vietnamese"),
    lang("hi", "🇮🇳 Hindi"),
    lang("uk", "🇺🇦 Ukrainian"),
];

/// Look up a catalog entry by code.
#[must_use]
pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|lang| lang.code == code)
}

/// Strip the leading flag glyph from a display name.
#[must_use]
pub fn bare_name(display: &str) -> &str {
    display.split_once(' ').map_or(display, |(_, name)| name)
}

// Keyed by the English display string
fn arabic_display(display: &str) -> Option<&'static str> {
    let name = match display {
        "🇬🇧 English" => "🇬🇧 الإنجليزية",
        "🇸🇦 Arabic" => "🇸🇦 العربية",
        "🇪🇸 Spanish" => "🇪🇸 الإسبانية",
        "🇫🇷 French" => "🇫🇷 الفرنسية",
        "🇩🇪 German" => "🇩🇪 الألمانية",
        "🇨🇳 Chinese" => "🇨🇳 الصينية",
        "🇷🇺 Russian" => "🇷🇺 الروسية",
        "🇵🇹 Portuguese" => "🇵🇹 البرتغالية",
        "🇯🇵 Japanese" => "🇯🇵 اليابانية",
        "🇮🇹 Italian" => "🇮🇹 الإيطالية",
        "🇰🇷 Korean" => "🇰🇷 الكورية",
        "🇹🇷 Turkish" => "🇹🇷 التركية",
        "🇳🇱 Dutch" => "🇳🇱 الهولندية",
        "🇸🇪 Swedish" => "🇸🇪 السويدية",
        "🇵🇱 Polish" => "🇵🇱 البولندية",
        "🇻🇳 Vietnamese" => "🇻🇳 الفيتنامية",
        "🇮🇳 Hindi" => "🇮🇳 الهندية",
        "🇺🇦 Ukrainian" => "🇺🇦 الأوكرانية",
        _ => return None,
    };
    Some(name)
}

/// Display name of a catalog language in the given interface language.
///
/// Falls back to the English display, then to the raw code.
#[must_use]
pub fn localized_display(ui_lang: UiLang, code: &str) -> String {
    let Some(language) = find_language(code) else {
        return code.to_string();
    };
    match ui_lang {
        UiLang::Ar => arabic_display(language.display)
            .unwrap_or(language.display)
            .to_string(),
        UiLang::En => language.display.to_string(),
    }
}

/// Name of an interface language, as shown on the interface keyboard.
#[must_use]
pub fn ui_language_name(ui_lang: UiLang, code: &str) -> &str {
    match (ui_lang, code) {
        (UiLang::En, "en") => "English",
        (UiLang::En, "ar") => "Arabic",
        (UiLang::Ar, "en") => "الإنجليزية",
        (UiLang::Ar, "ar") => "العربية",
        _ => code,
    }
}
