//! Executes dispatcher replies against the Bot API.
//!
//! Replies are performed in order. A failed reply is logged and the rest
//! still run, so a callback is answered even when an edit fails.

use anyhow::{anyhow, Result};
use ninja_translate_core::dispatcher::{Keyboard, Reply, TextFormat};
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

/// The update a list of replies answers.
pub enum Origin<'a> {
    /// A message (command or text)
    Message(&'a Message),
    /// A button press
    Callback(&'a CallbackQuery),
}

impl Origin<'_> {
    fn chat_id(&self) -> ChatId {
        match self {
            Self::Message(msg) => msg.chat.id,
            Self::Callback(q) => q
                .message
                .as_ref()
                .map_or_else(|| ChatId::from(q.from.id), |m| m.chat().id),
        }
    }

    /// Message the pressed button belongs to.
    fn button_message(&self) -> Option<MessageId> {
        match self {
            Self::Message(_) => None,
            Self::Callback(q) => q.message.as_ref().map(|m| m.id()),
        }
    }
}

/// Convert a dispatcher keyboard into Telegram inline markup.
#[must_use]
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.payload.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Parse mode matching a text format.
#[must_use]
pub const fn parse_mode(format: TextFormat) -> Option<ParseMode> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some(ParseMode::Html),
    }
}

/// Perform every reply in order.
///
/// # Errors
///
/// Returns an error naming how many replies failed; each failure is logged.
pub async fn deliver(bot: &Bot, origin: &Origin<'_>, replies: Vec<Reply>) -> Result<()> {
    let mut failed = 0_usize;
    for reply in replies {
        match perform(bot, origin, reply).await {
            Ok(()) => {}
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!("Message update skipped: message is not modified");
            }
            Err(e) => {
                warn!("Failed to deliver reply: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{failed} replies could not be delivered"));
    }
    Ok(())
}

async fn perform(bot: &Bot, origin: &Origin<'_>, reply: Reply) -> Result<(), RequestError> {
    let chat_id = origin.chat_id();

    match reply {
        Reply::Send {
            text,
            format,
            keyboard,
        } => send(bot, chat_id, text, format, keyboard).await,
        Reply::EditText {
            text,
            format,
            keyboard,
        } => {
            let Some(message_id) = origin.button_message() else {
                return send(bot, chat_id, text, format, keyboard).await;
            };
            let mut req = bot.edit_message_text(chat_id, message_id, text);
            if let Some(pm) = parse_mode(format) {
                req = req.parse_mode(pm);
            }
            if let Some(keyboard) = keyboard {
                req = req.reply_markup(inline_keyboard(&keyboard));
            }
            req.await.map(|_| ())
        }
        Reply::EditKeyboard { keyboard } => {
            let Some(message_id) = origin.button_message() else {
                debug!("No message to attach the keyboard to");
                return Ok(());
            };
            bot.edit_message_reply_markup(chat_id, message_id)
                .reply_markup(inline_keyboard(&keyboard))
                .await
                .map(|_| ())
        }
        Reply::AnswerCallback => {
            let Origin::Callback(q) = origin else {
                return Ok(());
            };
            bot.answer_callback_query(q.id.clone()).await.map(|_| ())
        }
    }
}

async fn send(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    format: TextFormat,
    keyboard: Option<Keyboard>,
) -> Result<(), RequestError> {
    let mut req = bot.send_message(chat_id, text);
    if let Some(pm) = parse_mode(format) {
        req = req.parse_mode(pm);
    }
    if let Some(keyboard) = keyboard {
        req = req.reply_markup(inline_keyboard(&keyboard));
    }
    req.await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ninja_translate_core::dispatcher::{source_keyboard, Button};
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_keyboard_conversion_keeps_layout() {
        let keyboard = Keyboard {
            rows: vec![
                vec![Button::new("title", "ignore")],
                vec![Button::new("A", "source_a"), Button::new("B", "source_b")],
            ],
        };
        let markup = inline_keyboard(&keyboard);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        let button = &markup.inline_keyboard[1][1];
        assert_eq!(button.text, "B");
        assert!(matches!(
            &button.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "source_b"
        ));
    }

    #[test]
    fn test_source_picker_fits_telegram_limits() {
        let markup = inline_keyboard(&source_keyboard());
        for button in markup.inline_keyboard.iter().flatten() {
            let InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
                panic!("expected callback buttons only");
            };
            // Bot API limit for callback data
            assert!(data.len() <= 64);
        }
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(parse_mode(TextFormat::Plain), None);
        assert_eq!(parse_mode(TextFormat::Html), Some(ParseMode::Html));
    }
}
