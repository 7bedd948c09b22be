use super::format;
use super::shared::{HandlerResult, begin_airtime_flow, send_leaderboard};
use super::state::{
    BotState, Conversation, is_admin, sender_first_name, sender_last_name, sender_user_id,
    sender_username,
};
use crate::notify;
use chrono::Local;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;
use url::Url;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum BotCommand {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Send airtime to a phone number")]
    SendAirtime,
    #[command(description = "Top senders")]
    Leaderboard,
    #[command(description = "Detailed instructions")]
    HowToUse,
    #[command(description = "Contact support")]
    ContactUs,
    #[command(description = "Bot statistics (admin)")]
    Stats,
    #[command(description = "Broadcast a message to all users (admin)")]
    Broadcast,
}

pub fn handler()
-> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    teloxide::filter_command::<BotCommand, _>()
        .branch(dptree::case![BotCommand::Start].endpoint(start_cmd))
        .branch(dptree::case![BotCommand::SendAirtime].endpoint(sendairtime_cmd))
        .branch(dptree::case![BotCommand::Leaderboard].endpoint(leaderboard_cmd))
        .branch(dptree::case![BotCommand::HowToUse].endpoint(howtouse_cmd))
        .branch(dptree::case![BotCommand::ContactUs].endpoint(contactus_cmd))
        .branch(dptree::case![BotCommand::Stats].endpoint(stats_cmd))
        .branch(dptree::case![BotCommand::Broadcast].endpoint(broadcast_cmd))
}

async fn start_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };
    let username = sender_username(&msg);
    tracing::info!(user_id = user_id, username = ?username, "Received /start command");

    state
        .db
        .upsert_user(
            user_id,
            username.as_deref(),
            sender_first_name(&msg).as_deref(),
            sender_last_name(&msg).as_deref(),
        )
        .await?;

    if !super::gate::is_member_of_required(&bot, &state, user_id).await {
        return super::gate::send_force_join_prompt(&bot, msg.chat.id, &state).await;
    }

    notify::spawn_activity_notification(
        bot.clone(),
        state.clone(),
        user_id,
        username,
        "Started the bot".to_string(),
        None,
    );

    let keyboard = crate::bot::keyboards::welcome_keyboard();
    let photo = Url::parse(&state.config.welcome_image_url)
        .ok()
        .map(InputFile::url);
    let photo_sent = match photo {
        Some(photo) => {
            match bot
                .send_photo(msg.chat.id, photo)
                .caption(format::welcome_message())
                .reply_markup(keyboard.clone())
                .await
            {
                Ok(_) => true,
                Err(error) => {
                    tracing::warn!(error = %error, "Failed to send welcome image, falling back to text");
                    false
                }
            }
        }
        None => false,
    };
    if !photo_sent {
        bot.send_message(msg.chat.id, format::welcome_message())
            .reply_markup(keyboard)
            .await?;
    }
    Ok(())
}

async fn sendairtime_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };
    tracing::info!(user_id = user_id, "Received /sendairtime command");
    begin_airtime_flow(&bot, msg.chat.id, user_id, &state).await
}

async fn leaderboard_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    send_leaderboard(&bot, msg.chat.id, &state, None).await
}

async fn howtouse_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    bot.send_message(msg.chat.id, format::how_to_use_text())
        .reply_markup(crate::bot::keyboards::tutorial_keyboard(
            &state.config.tutorial_url,
        ))
        .await?;
    Ok(())
}

async fn contactus_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    bot.send_message(msg.chat.id, format::contact_text())
        .reply_markup(crate::bot::keyboards::contact_keyboard(&state.config.links))
        .await?;
    Ok(())
}

async fn stats_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };
    if !is_admin(&state, user_id).await {
        bot.send_message(msg.chat.id, format::access_denied_text())
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    }

    let today_start = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).single())
        .map(|midnight| midnight.timestamp())
        .unwrap_or(0);
    let stats = state.db.stats(today_start).await?;
    bot.send_message(msg.chat.id, format::stats_dashboard(&stats))
        .await?;
    Ok(())
}

async fn broadcast_cmd(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };
    if !is_admin(&state, user_id).await {
        bot.send_message(msg.chat.id, format::access_denied_text())
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    }
    tracing::info!(user_id = user_id, "Broadcast mode armed");

    state
        .conversations
        .set(user_id, Conversation::AwaitingBroadcastInput)
        .await;
    bot.send_message(msg.chat.id, format::broadcast_prompt_text())
        .parse_mode(ParseMode::Markdown)
        .reply_markup(crate::bot::keyboards::cancel_broadcast_keyboard())
        .await?;
    Ok(())
}
