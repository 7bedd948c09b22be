//! Force-join gate: the bot is unusable until the user is a member of
//! every configured channel.

use super::shared::HandlerResult;
use super::state::BotState;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient, UserId};

/// True iff the user is owner, administrator or plain member of every
/// required channel. Any lookup failure is treated as "not a member".
pub async fn is_member_of_required(bot: &Bot, state: &BotState, user_id: i64) -> bool {
    for channel in &state.config.required_channels {
        let handle = crate::config::Config::channel_handle(channel);
        let recipient = Recipient::ChannelUsername(handle.clone());
        match bot.get_chat_member(recipient, UserId(user_id as u64)).await {
            Ok(member) => {
                let kind = &member.kind;
                if !(kind.is_owner() || kind.is_administrator() || kind.is_member()) {
                    return false;
                }
            }
            Err(error) => {
                tracing::warn!(
                    channel = %handle,
                    user_id = user_id,
                    error = %error,
                    "Membership check failed, treating as not a member"
                );
                return false;
            }
        }
    }
    true
}

/// Join prompt: one URL button per required channel plus the re-check
/// action.
pub async fn send_force_join_prompt(bot: &Bot, chat_id: ChatId, state: &BotState) -> HandlerResult {
    bot.send_message(chat_id, super::format::force_join_text())
        .parse_mode(ParseMode::Markdown)
        .reply_markup(crate::bot::keyboards::force_join_keyboard(
            &state.config.required_channels,
        ))
        .await?;
    Ok(())
}
