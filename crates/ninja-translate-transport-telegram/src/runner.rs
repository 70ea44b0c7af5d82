use crate::bot::handlers::{self, Command};
use crate::bot::TelegramChannelDirectory;
use crate::config::BotSettings;
use crate::health;
use ninja_translate_core::dispatcher::UpdateDispatcher;
use ninja_translate_core::llm::XaiTranslator;
use ninja_translate_core::storage::{ProfileStore, R2Storage};
use ninja_translate_core::subscription::{GateSettings, SubscriptionGate};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let storage = init_storage(&settings).await;

    let translator = Arc::new(XaiTranslator::new(settings.core.as_ref()));
    info!(model = %settings.core.xai_model, "Translator initialized.");

    let bot = Bot::new(settings.telegram.bot_token.clone());
    let gate = init_gate(&settings, &bot, storage.clone());
    let dispatcher = Arc::new(UpdateDispatcher::new(gate, storage, translator));

    // Long polling conflicts with a registered webhook.
    if let Err(e) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!("Failed to delete webhook: {e}");
    }

    if settings.telegram.health_server_enabled {
        tokio::spawn(health::serve(settings.telegram.port));
    }

    info!("Bot is running...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_storage(settings: &BotSettings) -> Arc<R2Storage> {
    match R2Storage::new(settings.core.as_ref()).await {
        Ok(s) => {
            info!("R2 Storage initialized.");
            if let Err(e) = s.check_connection().await {
                error!("R2 Storage connection check returned error: {e}");
            }
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to initialize R2 Storage: {e}");
            std::process::exit(1);
        }
    }
}

fn init_gate(settings: &BotSettings, bot: &Bot, storage: Arc<R2Storage>) -> SubscriptionGate {
    let gate_settings = GateSettings::from_core(settings.core.as_ref());
    info!(
        "Subscription gate: {} channel(s), {} admin(s), interval {} min",
        gate_settings.channels.len(),
        gate_settings.admins.len(),
        gate_settings.check_interval.num_minutes()
    );

    let directory = Arc::new(TelegramChannelDirectory::new(bot.clone()));
    SubscriptionGate::new(gate_settings, directory, storage)
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dispatcher: Arc<UpdateDispatcher>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::on_command(&bot, &msg, cmd, &dispatcher).await {
        error!("Command error: {e}");
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<UpdateDispatcher>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::on_text(&bot, &msg, &dispatcher).await {
        error!("Text handler error: {e}");
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dispatcher: Arc<UpdateDispatcher>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::on_callback(&bot, &q, &dispatcher).await {
        error!("Callback handler error: {e}");
    }
    respond(())
}
