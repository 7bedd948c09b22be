//! Inline keyboards for the user-facing flows.

use crate::config::{Config, ContactLinks, RequiredChannel};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

pub const CB_VERIFY_JOIN: &str = "verify_join";
pub const CB_SEND_AIRTIME: &str = "send_airtime";
pub const CB_SHOW_LEADERBOARD: &str = "show_leaderboard";
pub const CB_HOW_TO_USE: &str = "how_to_use";
pub const CB_CANCEL_BROADCAST: &str = "cancel_broadcast";

fn url_button(label: impl Into<String>, url: &str) -> Option<InlineKeyboardButton> {
    match Url::parse(url) {
        Ok(parsed) => Some(InlineKeyboardButton::url(label, parsed)),
        Err(error) => {
            tracing::warn!(url = url, error = %error, "Skipping button with invalid URL");
            None
        }
    }
}

/// One join button per required channel plus the verify action.
pub fn force_join_keyboard(channels: &[RequiredChannel]) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    for channel in channels {
        let name = Config::channel_handle(channel);
        let label = format!("Join {}", name.trim_start_matches('@'));
        if let Some(button) = url_button(label, &channel.invite_link) {
            keyboard = keyboard.append_row(vec![button]);
        }
    }
    keyboard.append_row(vec![InlineKeyboardButton::callback(
        "✅ I've Joined",
        CB_VERIFY_JOIN,
    )])
}

pub fn welcome_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default()
        .append_row(vec![InlineKeyboardButton::callback(
            "💸 Send Airtime",
            CB_SEND_AIRTIME,
        )])
        .append_row(vec![
            InlineKeyboardButton::callback("🏆 Leaderboard", CB_SHOW_LEADERBOARD),
            InlineKeyboardButton::callback("📘 How To Use", CB_HOW_TO_USE),
        ])
}

pub fn tutorial_keyboard(tutorial_url: &str) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    if let Some(button) = url_button("📺 Watch Tutorial", tutorial_url) {
        keyboard = keyboard.append_row(vec![button]);
    }
    keyboard
}

pub fn contact_keyboard(links: &ContactLinks) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    for (label, url) in [
        ("📩 Message Admin", links.admin_contact.as_str()),
        ("📢 Announcements", links.announcements.as_str()),
        ("💬 Support Channel", links.support.as_str()),
    ] {
        if let Some(button) = url_button(label, url) {
            keyboard = keyboard.append_row(vec![button]);
        }
    }
    keyboard
}

pub fn cancel_broadcast_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::default().append_row(vec![InlineKeyboardButton::callback(
        "❌ Cancel",
        CB_CANCEL_BROADCAST,
    )])
}

/// "Visit Bot" button under the admin-channel notification.
pub fn visit_bot_keyboard(bot_username: &str) -> InlineKeyboardMarkup {
    let mut keyboard = InlineKeyboardMarkup::default();
    let url = format!("https://t.me/{}", bot_username.trim_start_matches('@'));
    if let Some(button) = url_button("🤖 Visit Bot", &url) {
        keyboard = keyboard.append_row(vec![button]);
    }
    keyboard
}
