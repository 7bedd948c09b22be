//! Activity notifications for the admin log channel: a composed status
//! card (gradient backdrop, circular avatars, caption) sent whenever a
//! user starts the bot or completes a send.
//!
//! Everything here is best-effort. Notification failures are logged and
//! never surface into the user-facing flow.

use crate::bot::handlers::BotState;
use crate::bot::handlers::format;
use crate::db::TransactionRecord;
use ab_glyph::{FontVec, PxScale};
use chrono::Local;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Recipient, UserId};

const CARD_WIDTH: u32 = 800;
const CARD_HEIGHT: u32 = 400;
const AVATAR_SIZE: u32 = 120;

const GOLD: Rgba<u8> = Rgba([255, 215, 0, 255]);

/// Fires the notification in the background; a no-op when no
/// notification channel is configured.
pub fn spawn_activity_notification(
    bot: Bot,
    state: BotState,
    user_id: i64,
    username: Option<String>,
    action: String,
    transaction: Option<TransactionRecord>,
) {
    if state.config.notification_channel.is_none() {
        return;
    }
    tokio::spawn(async move {
        if let Err(error) =
            send_activity_notification(&bot, &state, user_id, username, &action, transaction).await
        {
            tracing::warn!(user_id = user_id, error = %error, "Activity notification failed");
        }
    });
}

async fn send_activity_notification(
    bot: &Bot,
    state: &BotState,
    user_id: i64,
    username: Option<String>,
    action: &str,
    transaction: Option<TransactionRecord>,
) -> Result<(), anyhow::Error> {
    let Some(channel) = state.config.notification_channel.as_deref() else {
        return Ok(());
    };
    let recipient = channel_recipient(channel);

    let caption = format::notification_caption(
        user_id,
        username.as_deref(),
        action,
        transaction.as_ref(),
        state.bot_username.as_deref(),
        Local::now(),
    );

    let user_avatar = fetch_avatar(bot, UserId(user_id as u64)).await;
    let bot_avatar = match bot.get_me().await {
        Ok(me) => fetch_avatar(bot, me.user.id).await,
        Err(error) => {
            tracing::debug!(error = %error, "getMe failed, using placeholder bot avatar");
            None
        }
    };

    let font = load_font(state.config.font_path.as_deref());
    let display_name = username
        .as_deref()
        .map(|name| format!("@{}", name))
        .unwrap_or_else(|| format!("ID {}", user_id));
    let card = compose_notification_card(
        user_avatar.as_ref(),
        bot_avatar.as_ref(),
        &display_name,
        action,
        font.as_ref(),
    )?;

    let photo = InputFile::memory(card).file_name("activity.png");
    let mut request = bot.send_photo(recipient.clone(), photo).caption(caption.clone());
    if let Some(bot_username) = state.bot_username.as_deref() {
        request = request.reply_markup(crate::bot::keyboards::visit_bot_keyboard(bot_username));
    }
    if let Err(error) = request.await {
        tracing::warn!(error = %error, "Notification photo rejected, sending caption only");
        bot.send_message(recipient, caption).await?;
    }
    Ok(())
}

/// `@name`, bare name, or a numeric chat id.
fn channel_recipient(raw: &str) -> Recipient {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        Recipient::Id(ChatId(id))
    } else if raw.starts_with('@') {
        Recipient::ChannelUsername(raw.to_string())
    } else {
        Recipient::ChannelUsername(format!("@{}", raw))
    }
}

/// Largest variant of the first profile photo, decoded; `None` when the
/// user has no photo or any step of the download fails.
async fn fetch_avatar(bot: &Bot, user_id: UserId) -> Option<RgbaImage> {
    let photos = match bot.get_user_profile_photos(user_id).limit(1).await {
        Ok(photos) => photos,
        Err(error) => {
            tracing::debug!(user_id = user_id.0, error = %error, "Profile photo lookup failed");
            return None;
        }
    };
    let photo = photos.photos.first()?.last()?;
    let file = match bot.get_file(photo.file.id.clone()).await {
        Ok(file) => file,
        Err(error) => {
            tracing::debug!(user_id = user_id.0, error = %error, "getFile failed for avatar");
            return None;
        }
    };
    let mut buffer = Cursor::new(Vec::new());
    if let Err(error) = bot.download_file(&file.path, &mut buffer).await {
        tracing::debug!(user_id = user_id.0, error = %error, "Avatar download failed");
        return None;
    }
    match image::load_from_memory(buffer.get_ref()) {
        Ok(decoded) => Some(decoded.to_rgba8()),
        Err(error) => {
            tracing::debug!(user_id = user_id.0, error = %error, "Avatar decode failed");
            None
        }
    }
}

fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    let fallbacks = [
        Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
        Path::new("/usr/share/fonts/TTF/DejaVuSans-Bold.ttf"),
    ];
    for path in configured.into_iter().chain(fallbacks) {
        match std::fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => return Some(font),
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "Unusable font file");
                }
            },
            Err(_) => continue,
        }
    }
    tracing::warn!("No usable font found, notification card will have no text");
    None
}

/// Renders the 800x400 card and encodes it as PNG. Missing avatars get
/// a placeholder circle; a missing font drops the text layer only.
fn compose_notification_card(
    user_avatar: Option<&RgbaImage>,
    bot_avatar: Option<&RgbaImage>,
    display_name: &str,
    action: &str,
    font: Option<&FontVec>,
) -> Result<Vec<u8>, anyhow::Error> {
    let mut card = gradient_backdrop();

    let user_center = (200i32, 170i32);
    let bot_center = (600i32, 170i32);
    draw_glow(&mut card, user_center);
    draw_glow(&mut card, bot_center);
    place_avatar(&mut card, user_avatar, user_center);
    place_avatar(&mut card, bot_avatar, bot_center);

    let banner_height = 40u32;
    draw_filled_rect_mut(
        &mut card,
        Rect::at(0, (CARD_HEIGHT - banner_height) as i32)
            .of_size(CARD_WIDTH, banner_height),
        GOLD,
    );

    if let Some(font) = font {
        let white = Rgba([240, 240, 240, 255]);
        let dark = Rgba([20, 20, 30, 255]);
        draw_centered_text(&mut card, white, 24, PxScale::from(36.0), font, "NEW USER ACTIVITY");
        draw_text_centered_at(
            &mut card,
            white,
            user_center.0,
            244,
            PxScale::from(24.0),
            font,
            &truncate_label(display_name, 16),
        );
        draw_text_centered_at(
            &mut card,
            white,
            bot_center.0,
            244,
            PxScale::from(24.0),
            font,
            "Airtime Bot",
        );
        draw_centered_text(&mut card, GOLD, 290, PxScale::from(28.0), font, action);
        draw_centered_text(
            &mut card,
            dark,
            (CARD_HEIGHT - banner_height) as i32 + 8,
            PxScale::from(22.0),
            font,
            "Powered by Airtime Bot",
        );
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(card).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Vertical fade from slate to near-black.
fn gradient_backdrop() -> RgbaImage {
    let top = [30.0f32, 30.0, 45.0];
    let bottom = [10.0f32, 10.0, 25.0];
    RgbaImage::from_fn(CARD_WIDTH, CARD_HEIGHT, |_, y| {
        let t = y as f32 / (CARD_HEIGHT - 1) as f32;
        let channel = |i: usize| (top[i] + (bottom[i] - top[i]) * t) as u8;
        Rgba([channel(0), channel(1), channel(2), 255])
    })
}

fn draw_glow(card: &mut RgbaImage, center: (i32, i32)) {
    let base_radius = (AVATAR_SIZE / 2) as i32;
    for (offset, alpha) in [(4, 200u8), (8, 120), (12, 60)] {
        draw_hollow_circle_mut(
            card,
            center,
            base_radius + offset,
            Rgba([255, 215, 0, alpha]),
        );
    }
}

/// Resizes to the avatar slot and applies a circular mask; no source
/// image means a flat placeholder disc.
fn place_avatar(card: &mut RgbaImage, avatar: Option<&RgbaImage>, center: (i32, i32)) {
    let radius = (AVATAR_SIZE / 2) as i64;
    match avatar {
        Some(avatar) => {
            let mut scaled = imageops::resize(
                avatar,
                AVATAR_SIZE,
                AVATAR_SIZE,
                imageops::FilterType::Lanczos3,
            );
            for (x, y, pixel) in scaled.enumerate_pixels_mut() {
                let dx = x as i64 - radius;
                let dy = y as i64 - radius;
                if dx * dx + dy * dy > radius * radius {
                    pixel.0[3] = 0;
                }
            }
            imageops::overlay(
                card,
                &scaled,
                (center.0 as i64) - radius,
                (center.1 as i64) - radius,
            );
        }
        None => {
            draw_filled_circle_mut(card, center, radius as i32, Rgba([90, 90, 110, 255]));
        }
    }
}

fn draw_centered_text(
    card: &mut RgbaImage,
    color: Rgba<u8>,
    y: i32,
    scale: PxScale,
    font: &FontVec,
    text: &str,
) {
    draw_text_centered_at(card, color, (CARD_WIDTH / 2) as i32, y, scale, font, text);
}

fn draw_text_centered_at(
    card: &mut RgbaImage,
    color: Rgba<u8>,
    center_x: i32,
    y: i32,
    scale: PxScale,
    font: &FontVec,
    text: &str,
) {
    let (width, _) = text_size(scale, font, text);
    let x = center_x - (width / 2) as i32;
    draw_text_mut(card, color, x, y, scale, font, text);
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_is_valid_png_with_expected_dimensions() {
        let card = compose_notification_card(None, None, "@someone", "Started the bot", None)
            .unwrap();
        assert_eq!(&card[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&card).unwrap();
        assert_eq!(decoded.width(), CARD_WIDTH);
        assert_eq!(decoded.height(), CARD_HEIGHT);
    }

    #[test]
    fn avatar_is_masked_to_a_circle() {
        let avatar = RgbaImage::from_pixel(240, 240, Rgba([255, 0, 0, 255]));
        let mut card = gradient_backdrop();
        let backdrop_corner = *card.get_pixel(140, 110);
        place_avatar(&mut card, Some(&avatar), (200, 170));
        // Center of the slot is avatar red, the slot's corner stays
        // backdrop-colored because the mask cut it away.
        assert_eq!(*card.get_pixel(200, 170), Rgba([255, 0, 0, 255]));
        assert_eq!(*card.get_pixel(140, 110), backdrop_corner);
    }

    #[test]
    fn labels_are_truncated_with_ellipsis() {
        assert_eq!(truncate_label("short", 16), "short");
        assert_eq!(
            truncate_label("a_very_long_username_indeed", 16),
            "a_very_long_use…"
        );
    }

    #[test]
    fn channel_recipient_accepts_all_forms() {
        assert_eq!(
            channel_recipient("@logs"),
            Recipient::ChannelUsername("@logs".to_string())
        );
        assert_eq!(
            channel_recipient("logs"),
            Recipient::ChannelUsername("@logs".to_string())
        );
        assert_eq!(channel_recipient("-100123"), Recipient::Id(ChatId(-100123)));
    }
}
