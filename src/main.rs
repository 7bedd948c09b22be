//! airtime-prank-bot — a novelty Telegram bot that pretends to send
//! mobile airtime and keeps score of the pranks.

mod bot;
mod classify;
mod config;
mod db;
mod notify;

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::dispatching::Dispatcher;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc/airtime-bot.toml"));
    tracing::info!(
        "Starting airtime-prank-bot with config {}",
        config_path.display()
    );

    let config = Arc::new(config::Config::load(&config_path)?);
    let token = config.bot_token()?;
    tracing::info!(
        admin_count = config.admin_ids.len(),
        db_path = %config.db_path.display(),
        required_channels = config.required_channels.len(),
        transport = ?config.transport,
        "Configuration loaded"
    );

    let db = Arc::new(db::Db::open(&config.db_path).await?);
    db.seed_admins(&config.admin_ids).await?;

    let bot = Bot::new(token);
    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(error) => {
            tracing::warn!(error = %error, "Could not resolve bot username via getMe");
            None
        }
    };

    let state = bot::handlers::BotState {
        config: config.clone(),
        db,
        bot_username,
        conversations: bot::handlers::state::ConversationMap::new(),
    };
    tracing::info!("Dispatcher initialized, bot is ready");

    let mut dispatcher = Dispatcher::builder(bot.clone(), bot::handlers::schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();

    match config.transport {
        config::Transport::Polling => dispatcher.dispatch().await,
        config::Transport::Webhook => {
            let webhook_url = config
                .webhook_url
                .as_deref()
                .ok_or("webhook transport without webhook_url")?;
            let mut url: url::Url = webhook_url.parse()?;
            url.set_path("/webhook");
            let address = ([0, 0, 0, 0], config.port).into();
            let listener = webhooks::axum(bot, webhooks::Options::new(address, url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    Ok(())
}
