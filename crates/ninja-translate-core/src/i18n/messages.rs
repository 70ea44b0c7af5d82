//! Reply templates for every interface language.

use super::{MessageKey, UiLang};

pub(super) fn lookup(lang: UiLang, key: MessageKey) -> Option<&'static str> {
    match lang {
        UiLang::En => Some(english(key)),
        UiLang::Ar => arabic(key),
    }
}

const fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Welcome => "Welcome to NinjaTranslate! Please select source language:",
        MessageKey::Selected => "Selected {from_lang} → {to_lang} translation.\nSend me text to translate (max 2000 characters).",
        MessageKey::SelectedSource => "Source language: {source_lang}\nNow select target language:",
        MessageKey::SelectSource => "Please select source language:",
        MessageKey::SelectFirst => "Please select source language first:",
        MessageKey::TextTooLong => "Text is too long. Maximum is 2000 characters.",
        MessageKey::Error => "Error during translation. Please try again later.",
        MessageKey::LanguageCmd => "Select interface language:",
        MessageKey::LanguageSelected => "Interface language set to English.",
        MessageKey::Stats => "📊 Bot Statistics\n\n👥 Total Users: {total_users}\n🇬🇧 English UI: {english_ui}\n🇸🇦 Arabic UI: {arabic_ui}\n💫 Subscribed Users: {subscribed_users}",
        MessageKey::SubscriptionRequired => "⚠️ Subscription Required ⚠️\n\nTo use NinjaTranslate bot, you need to subscribe to the following channels:\n\n{channel_links}\n\nAfter subscribing, click the \"Check Subscription\" button below.",
        MessageKey::SubscriptionCheck => "Check Subscription",
        MessageKey::SubscriptionVerified => "✅ Thank you! Your subscription has been verified. You can now use the bot.",
        MessageKey::SubscriptionNotVerified => "❌ You need to subscribe to all required channels to use the bot.\n\nPlease subscribe to:\n\n{channel_links}\n\nAfter subscribing, click the \"Check Subscription\" button again.",
    }
}

const fn arabic(key: MessageKey) -> Option<&'static str> {
    let text = match key {
        MessageKey::Welcome => "مرحبًا بك في NinjaTranslate! يرجى اختيار لغة المصدر:",
        MessageKey::Selected => "تم اختيار الترجمة من {from_lang} إلى {to_lang}.\nأرسل لي النص المراد ترجمته (بحد أقصى 2000 حرف).",
        MessageKey::SelectedSource => "لغة المصدر: {source_lang}\nاختر الآن لغة الهدف:",
        MessageKey::SelectSource => "يرجى اختيار لغة المصدر:",
        MessageKey::SelectFirst => "يرجى اختيار لغة المصدر أولاً:",
        MessageKey::TextTooLong => "النص طويل جدًا. الحد الأقصى هو 2000 حرف.",
        MessageKey::Error => "حدث خطأ أثناء الترجمة. يرجى المحاولة مرة أخرى لاحقًا.",
        MessageKey::LanguageCmd => "اختر لغة الواجهة:",
        MessageKey::LanguageSelected => "تم ضبط لغة الواجهة على العربية.",
        MessageKey::Stats => "📊 إحصائيات البوت\n\n👥 إجمالي المستخدمين: {total_users}\n🇬🇧 واجهة إنجليزية: {english_ui}\n🇸🇦 واجهة عربية: {arabic_ui}\n💫 المستخدمون المشتركون: {subscribed_users}",
        MessageKey::SubscriptionRequired => "⚠️ الاشتراك مطلوب ⚠️\n\nلاستخدام بوت NinjaTranslate، يجب عليك الاشتراك في القنوات التالية:\n\n{channel_links}\n\nبعد الاشتراك، انقر على زر \"التحقق من الاشتراك\" أدناه.",
        MessageKey::SubscriptionCheck => "التحقق من الاشتراك",
        MessageKey::SubscriptionVerified => "✅ شكراً لك! تم التحقق من اشتراكك. يمكنك الآن استخدام البوت.",
        MessageKey::SubscriptionNotVerified => "❌ يجب عليك الاشتراك في جميع القنوات المطلوبة لاستخدام البوت.\n\nيرجى الاشتراك في:\n\n{channel_links}\n\nبعد الاشتراك، انقر على زر \"التحقق من الاشتراك\" مرة أخرى.",
    };
    Some(text)
}
