use crate::bot::delivery::{deliver, Origin};
use anyhow::Result;
use ninja_translate_core::dispatcher::{BotCommand, Inbound, UpdateDispatcher};
use ninja_translate_core::storage::UserIdentity;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, User},
    utils::command::BotCommands,
};
use tracing::debug;

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Register and pick a translation direction
    #[command(description = "Start the bot.")]
    Start,
    /// Choose the interface language
    #[command(description = "Choose the interface language.", aliases = ["lang"])]
    Language,
    /// Choose a new translation direction
    #[command(description = "Choose the translation direction.", aliases = ["tr"])]
    Translate,
    /// Show bot statistics (admins only)
    #[command(description = "Show bot statistics.", hide)]
    Stats,
}

impl From<Command> for BotCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Self::Start,
            Command::Language => Self::Language,
            Command::Translate => Self::Translate,
            Command::Stats => Self::Stats,
        }
    }
}

/// Platform identity of a Telegram user.
#[must_use]
pub fn user_identity(user: &User) -> UserIdentity {
    UserIdentity {
        user_id: user.id.0.cast_signed(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// Route a parsed command through the dispatcher.
///
/// # Errors
///
/// Returns an error if any reply could not be delivered.
pub async fn on_command(
    bot: &Bot,
    msg: &Message,
    cmd: Command,
    dispatcher: &UpdateDispatcher,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!("Ignoring command without sender");
        return Ok(());
    };
    let inbound = Inbound::command(user_identity(user), cmd.into());
    let replies = dispatcher.handle(&inbound).await;
    deliver(bot, &Origin::Message(msg), replies).await
}

/// Route a free-text message through the dispatcher.
///
/// # Errors
///
/// Returns an error if any reply could not be delivered.
pub async fn on_text(bot: &Bot, msg: &Message, dispatcher: &UpdateDispatcher) -> Result<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        debug!("Ignoring message without sender or text");
        return Ok(());
    };
    let inbound = Inbound::text(user_identity(user), text);
    let replies = dispatcher.handle(&inbound).await;
    deliver(bot, &Origin::Message(msg), replies).await
}

/// Route a button press through the dispatcher.
///
/// # Errors
///
/// Returns an error if any reply could not be delivered.
pub async fn on_callback(
    bot: &Bot,
    q: &CallbackQuery,
    dispatcher: &UpdateDispatcher,
) -> Result<()> {
    let payload = q.data.clone().unwrap_or_default();
    let inbound = Inbound::callback(user_identity(&q.from), payload);
    let replies = dispatcher.handle(&inbound).await;
    deliver(bot, &Origin::Callback(q), replies).await
}
