//! Admin broadcast fan-out with a fixed inter-send delay.

use super::format;
use super::state::BotState;
use std::time::Duration;
use teloxide::prelude::*;

/// Sends `text` to every known user, one at a time, sleeping between
/// sends to stay under the API flood limits. Individual failures
/// (blocked bot, deactivated account) are counted and skipped; the
/// fan-out always runs to completion and reports both tallies.
pub async fn run_broadcast(bot: Bot, state: BotState, admin_chat: ChatId, text: String) {
    let user_ids = match state.db.all_user_ids().await {
        Ok(ids) => ids,
        Err(error) => {
            tracing::error!(error = %error, "Could not load broadcast recipients");
            let _ = bot
                .send_message(admin_chat, "❌ Broadcast failed: could not load users.")
                .await;
            return;
        }
    };

    let progress = match bot
        .send_message(admin_chat, format::broadcast_progress(user_ids.len()))
        .await
    {
        Ok(message) => Some(message.id),
        Err(error) => {
            tracing::warn!(error = %error, "Could not send broadcast progress message");
            None
        }
    };

    let delay = Duration::from_millis(state.config.broadcast_delay_ms);
    let mut success = 0usize;
    let mut failures = 0usize;
    for user_id in user_ids {
        match bot.send_message(ChatId(user_id), text.clone()).await {
            Ok(_) => success += 1,
            Err(error) => {
                failures += 1;
                tracing::debug!(user_id = user_id, error = %error, "Broadcast send failed");
            }
        }
        tokio::time::sleep(delay).await;
    }
    tracing::info!(success = success, failures = failures, "Broadcast finished");

    let results = format::broadcast_results(success, failures);
    let reported = match progress {
        Some(message_id) => bot
            .edit_message_text(admin_chat, message_id, results.clone())
            .parse_mode(teloxide::types::ParseMode::Markdown)
            .await
            .is_ok(),
        None => false,
    };
    if !reported {
        if let Err(error) = bot
            .send_message(admin_chat, results)
            .parse_mode(teloxide::types::ParseMode::Markdown)
            .await
        {
            tracing::warn!(error = %error, "Could not report broadcast results");
        }
    }
}
