use super::format;
use super::state::{BotState, Conversation};
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use thiserror::Error;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AirtimeInputError {
    #[error("expected exactly two tokens: phone number and amount")]
    WrongTokenCount,
    #[error("amount is not an integer")]
    InvalidAmount,
    #[error("amount must be positive")]
    NonPositiveAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtimeRequest {
    pub phone: String,
    pub amount: i64,
}

/// Airtime input: whitespace-split, exactly two tokens, the second a
/// positive integer. Phone validity beyond non-emptiness is not checked
/// here; classification failure degrades to "Unknown" downstream.
pub fn parse_airtime_input(text: &str) -> Result<AirtimeRequest, AirtimeInputError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [phone, amount] = tokens.as_slice() else {
        return Err(AirtimeInputError::WrongTokenCount);
    };
    // Digits only (an optional `-` is let through so a negative amount
    // reports as non-positive, not malformed). `i64::from_str` alone is
    // too lenient: it accepts a leading `+`, which would make a swapped
    // phone/amount pair parse as a huge amount.
    let digits = amount.strip_prefix('-').unwrap_or(amount);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AirtimeInputError::InvalidAmount);
    }
    let amount: i64 = amount
        .parse()
        .map_err(|_| AirtimeInputError::InvalidAmount)?;
    if amount <= 0 {
        return Err(AirtimeInputError::NonPositiveAmount);
    }
    Ok(AirtimeRequest {
        phone: phone.to_string(),
        amount,
    })
}

/// Cosmetic transfer animation: a bounded, ticked sequence of edits to
/// one message. Edit failures (including "message is not modified") are
/// logged and skipped; the flow never aborts on them.
pub async fn run_progress_animation(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    header: &str,
) {
    const STEPS: u32 = 10;
    let mut ticker = tokio::time::interval(Duration::from_millis(120));
    for step in 1..=STEPS {
        ticker.tick().await;
        let text = format!(
            "{}\n\n{}",
            header,
            format::progress_bar(step * 100 / STEPS)
        );
        if let Err(error) = bot.edit_message_text(chat_id, message_id, text).await {
            tracing::debug!(error = %error, "Progress edit skipped");
        }
    }
}

/// Starts the send flow: membership-gated, arms the awaiting-input flag
/// (replacing any other pending state) and prompts for the details.
pub async fn begin_airtime_flow(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    state: &BotState,
) -> HandlerResult {
    if !super::gate::is_member_of_required(bot, state, user_id).await {
        return super::gate::send_force_join_prompt(bot, chat_id, state).await;
    }

    state
        .conversations
        .set(user_id, Conversation::AwaitingAirtimeInput)
        .await;
    bot.send_message(chat_id, format::airtime_prompt_text())
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Renders the top-10 board; edits in place when invoked from a button.
pub async fn send_leaderboard(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
    edit_message: Option<MessageId>,
) -> HandlerResult {
    let entries = state.db.leaderboard(10).await?;
    let text = format::leaderboard_text(&entries);
    match edit_message {
        Some(message_id) => {
            if let Err(error) = bot
                .edit_message_text(chat_id, message_id, text.clone())
                .parse_mode(ParseMode::Markdown)
                .await
            {
                tracing::debug!(error = %error, "Leaderboard edit failed, sending fresh message");
                bot.send_message(chat_id, text)
                    .parse_mode(ParseMode::Markdown)
                    .await?;
            }
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
    }
    Ok(())
}

/// dptree filter for exact-match callback identifiers.
pub fn callback_exact_filter(data: &'static str) -> impl Fn(CallbackQuery) -> Option<CallbackQuery> {
    move |q: CallbackQuery| {
        if q.data.as_deref() == Some(data) {
            Some(q)
        } else {
            None
        }
    }
}

pub fn callback_message_target(q: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    q.message.as_ref().map(|msg| (msg.chat().id, msg.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_phone_then_amount() {
        assert_eq!(
            parse_airtime_input("+256751722034 5000"),
            Ok(AirtimeRequest {
                phone: "+256751722034".to_string(),
                amount: 5000,
            })
        );
    }

    #[test]
    fn tolerates_extra_whitespace() {
        assert_eq!(
            parse_airtime_input("  +256751722034   5000  "),
            Ok(AirtimeRequest {
                phone: "+256751722034".to_string(),
                amount: 5000,
            })
        );
    }

    #[test]
    fn rejects_swapped_tokens() {
        // "5000 +256751722034": the second token is not a plain digit
        // string, even though `+256751722034` parses as an i64.
        assert_eq!(
            parse_airtime_input("5000 +256751722034"),
            Err(AirtimeInputError::InvalidAmount)
        );
    }

    #[test]
    fn rejects_plus_signed_amount() {
        assert_eq!(
            parse_airtime_input("+256751722034 +5000"),
            Err(AirtimeInputError::InvalidAmount)
        );
        assert_eq!(
            parse_airtime_input("+256751722034 5e3"),
            Err(AirtimeInputError::InvalidAmount)
        );
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert_eq!(
            parse_airtime_input("+256751722034"),
            Err(AirtimeInputError::WrongTokenCount)
        );
        assert_eq!(
            parse_airtime_input("+256751722034 5000 extra"),
            Err(AirtimeInputError::WrongTokenCount)
        );
        assert_eq!(
            parse_airtime_input(""),
            Err(AirtimeInputError::WrongTokenCount)
        );
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert_eq!(
            parse_airtime_input("+256751722034 -5"),
            Err(AirtimeInputError::NonPositiveAmount)
        );
        assert_eq!(
            parse_airtime_input("+256751722034 0"),
            Err(AirtimeInputError::NonPositiveAmount)
        );
    }
}
