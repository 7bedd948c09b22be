use super::format;
use super::shared::{
    HandlerResult, begin_airtime_flow, callback_exact_filter, callback_message_target,
    send_leaderboard,
};
use super::state::{BotState, Conversation};
use crate::bot::keyboards::{
    CB_CANCEL_BROADCAST, CB_HOW_TO_USE, CB_SEND_AIRTIME, CB_SHOW_LEADERBOARD, CB_VERIFY_JOIN,
};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

pub fn handler()
-> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_callback_query()
        .branch(dptree::filter_map(callback_exact_filter(CB_VERIFY_JOIN)).endpoint(callback_verify_join))
        .branch(
            dptree::filter_map(callback_exact_filter(CB_SEND_AIRTIME)).endpoint(callback_send_airtime),
        )
        .branch(
            dptree::filter_map(callback_exact_filter(CB_SHOW_LEADERBOARD))
                .endpoint(callback_show_leaderboard),
        )
        .branch(dptree::filter_map(callback_exact_filter(CB_HOW_TO_USE)).endpoint(callback_how_to_use))
        .branch(
            dptree::filter_map(callback_exact_filter(CB_CANCEL_BROADCAST))
                .endpoint(callback_cancel_broadcast),
        )
}

async fn callback_verify_join(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    if super::gate::is_member_of_required(&bot, &state, user_id).await {
        bot.answer_callback_query(q.id.clone())
            .text("✅ Verification successful! You can now use the bot.")
            .await?;
        if let Some((chat_id, message_id)) = callback_message_target(&q) {
            bot.edit_message_text(chat_id, message_id, format::join_verified_text())
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        tracing::info!(user_id = user_id, "Join verification passed");
    } else {
        bot.answer_callback_query(q.id.clone())
            .text("❌ You haven't joined all channels yet!")
            .show_alert(true)
            .await?;
    }
    Ok(())
}

async fn callback_send_airtime(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    bot.answer_callback_query(q.id.clone()).await?;
    let chat_id = callback_message_target(&q)
        .map(|(chat_id, _)| chat_id)
        .unwrap_or(ChatId(user_id));
    begin_airtime_flow(&bot, chat_id, user_id, &state).await
}

async fn callback_show_leaderboard(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    if let Some((chat_id, message_id)) = callback_message_target(&q) {
        send_leaderboard(&bot, chat_id, &state, Some(message_id)).await?;
    }
    Ok(())
}

async fn callback_how_to_use(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    if let Some((chat_id, message_id)) = callback_message_target(&q) {
        let keyboard = crate::bot::keyboards::tutorial_keyboard(&state.config.tutorial_url);
        if let Err(error) = bot
            .edit_message_text(chat_id, message_id, format::how_to_use_text())
            .reply_markup(keyboard.clone())
            .await
        {
            tracing::debug!(error = %error, "Guide edit failed, sending fresh message");
            bot.send_message(chat_id, format::how_to_use_text())
                .reply_markup(keyboard)
                .await?;
        }
    }
    Ok(())
}

/// Disarms a pending broadcast. An already-running fan-out is not
/// affected; only the next payload message is.
async fn callback_cancel_broadcast(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    state.conversations.set(user_id, Conversation::Idle).await;
    bot.answer_callback_query(q.id.clone())
        .text("Broadcast canceled.")
        .await?;
    if let Some((chat_id, message_id)) = callback_message_target(&q) {
        bot.edit_message_text(chat_id, message_id, format::broadcast_cancelled_text())
            .parse_mode(ParseMode::Markdown)
            .await?;
    }
    tracing::info!(user_id = user_id, "Broadcast cancelled before payload");
    Ok(())
}
