//! Free-text router. Runs after the command branch: plain text is only
//! meaningful when the sender has a pending conversation.

use super::broadcast;
use super::format;
use super::shared::{HandlerResult, parse_airtime_input, run_progress_animation};
use super::state::{BotState, Conversation, is_admin, sender_first_name, sender_user_id, sender_username};
use crate::notify;
use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use url::Url;

pub async fn handle_text(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let Some(user_id) = sender_user_id(&msg) else {
        return Ok(());
    };
    let Some(text) = msg.text().map(str::to_owned) else {
        return Ok(());
    };
    // Commands never count as conversation payload. Known ones were
    // already routed by the command branch; unknown ones (typos like
    // `/stast`) are ignored here and the pending state stays armed.
    if is_command_text(&text) {
        return Ok(());
    }

    // Read-and-disarm: the pending state is consumed up front so a
    // failed send never leaves the user stuck mid-flow.
    match state.conversations.take(user_id).await {
        Conversation::AwaitingAirtimeInput => {
            handle_airtime_input(&bot, &msg, &state, user_id, &text).await
        }
        Conversation::AwaitingBroadcastInput => {
            handle_broadcast_input(&bot, &msg, &state, user_id, text).await
        }
        Conversation::Idle => Ok(()),
    }
}

fn is_command_text(text: &str) -> bool {
    text.starts_with('/')
}

async fn handle_airtime_input(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    user_id: i64,
    text: &str,
) -> HandlerResult {
    let request = match parse_airtime_input(text) {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(user_id = user_id, error = %error, "Rejected airtime input");
            // Re-prompt without re-arming: the user restarts the flow
            // explicitly, so a bad message can never loop the prompt.
            bot.send_message(msg.chat.id, format::invalid_airtime_input_text())
                .parse_mode(ParseMode::Markdown)
                .await?;
            return Ok(());
        }
    };

    let username = sender_username(msg);
    let txn = state
        .db
        .record_transaction(user_id, username.as_deref(), &request.phone, request.amount)
        .await?;
    tracing::info!(
        user_id = user_id,
        phone = %request.phone,
        amount = request.amount,
        txn_id = %txn.txn_id,
        "Recorded airtime send"
    );

    notify::spawn_activity_notification(
        bot.clone(),
        state.clone(),
        user_id,
        username,
        "Sent Airtime".to_string(),
        Some(txn),
    );

    let header = format::progress_header(&request.phone, request.amount);
    let progress = bot
        .send_message(
            msg.chat.id,
            format!("{}\n\n{}", header, format::progress_bar(0)),
        )
        .await?;
    run_progress_animation(bot, msg.chat.id, progress.id, &header).await;

    let name = sender_first_name(msg).unwrap_or_else(|| "Friend".to_string());
    let receipt = format::airtime_receipt(&request.phone, request.amount, &name, Local::now());
    let photo = Url::parse(&state.config.success_image_url)
        .ok()
        .map(InputFile::url);
    let photo_sent = match photo {
        Some(photo) => bot
            .send_photo(msg.chat.id, photo)
            .caption(receipt.clone())
            .await
            .map_err(|error| {
                tracing::warn!(error = %error, "Failed to send receipt image, falling back to text");
            })
            .is_ok(),
        None => false,
    };
    if !photo_sent {
        bot.send_message(msg.chat.id, receipt).await?;
    }

    if let Err(error) = bot.delete_message(msg.chat.id, progress.id).await {
        tracing::debug!(error = %error, "Could not delete progress message");
    }
    Ok(())
}

async fn handle_broadcast_input(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    user_id: i64,
    text: String,
) -> HandlerResult {
    // Re-checked here: the admin set may have changed since arming.
    if !is_admin(state, user_id).await {
        bot.send_message(msg.chat.id, format::access_denied_text())
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    }
    tracing::info!(user_id = user_id, "Starting broadcast fan-out");
    tokio::spawn(broadcast::run_broadcast(
        bot.clone(),
        state.clone(),
        msg.chat.id,
        text,
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_messages_are_commands_not_payload() {
        assert!(is_command_text("/stast"));
        assert!(is_command_text("/broadcast"));
        assert!(is_command_text("/start@some_bot extra"));
        assert!(!is_command_text("hello /everyone"));
        assert!(!is_command_text("+256751722034 5000"));
    }
}
