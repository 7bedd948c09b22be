//! Message templates and text rendering. Everything here is pure:
//! time-dependent templates take the timestamp as an argument.

use crate::classify::classify;
use crate::db::{BotStats, LeaderboardEntry, TransactionRecord};
use chrono::{DateTime, TimeZone};

pub fn welcome_message() -> &'static str {
    r#"🌟 Welcome to the Airtime Sender Bot! 🌟

🎭 This is a fun prank tool that "sends" airtime to phone numbers.

✨ Quick Commands:
🔹 /sendairtime – Start the airtime sending process
🔹 /howtouse – Detailed instructions
🔹 /leaderboard – Top senders
🔹 /contactus – Contact support

⚠️ Note: This is just for fun! No real airtime is sent."#
}

pub fn force_join_text() -> &'static str {
    "🔒 *Access Restricted* 🔒\n\n\
     To use this bot, you must join our official channels:\n\n\
     👉 Tap each button below to join\n\
     👉 Then click 'I've Joined' to verify"
}

pub fn join_verified_text() -> &'static str {
    "✅ *Verification Complete!*\n\n\
     You've successfully joined all required channels.\n\
     Use /start to begin!"
}

pub fn airtime_prompt_text() -> &'static str {
    "📱 *Airtime sending process*\n\n\
     Please send the phone number with country code and amount:\n\
     Example: `+256751722034 5000`\n\n\
     🔒 We don't store or use real numbers"
}

pub fn invalid_airtime_input_text() -> &'static str {
    "❌ Invalid format. Please send:\n\
     Phone Number amount\n\
     Example: `+256751722034 5000`"
}

pub fn access_denied_text() -> &'static str {
    "⛔ *Access Denied*"
}

pub fn broadcast_prompt_text() -> &'static str {
    "📢 *Broadcast Mode Enabled*\n\n\
     Please send the message you want to broadcast to all users.\n\n\
     If you want to cancel, click the button below."
}

pub fn broadcast_cancelled_text() -> &'static str {
    "📢 *Broadcast Canceled*"
}

pub fn how_to_use_text() -> &'static str {
    r#"📘 Airtime Sender Bot Guide 📘

1️⃣ Getting Started
- Use /start to begin
- Join required channels if prompted

2️⃣ Sending Process
- Use /sendairtime
- Enter phone number and amount
- Watch the magic happen!

3️⃣ Features
- Fun airtime sending simulation
- Leaderboard tracking
- Regular updates

4️⃣ Important Notes
- This is just for entertainment
- No real airtime is sent
- No personal data is stored

🎉 Enjoy the experience!"#
}

pub fn contact_text() -> &'static str {
    r#"📞 Contact Information 📞

🔹 Email: freenethubbusiness@gmail.com
🔹 Business Hours: 9AM - 5PM (EAT)

📌 For:
- Business inquiries
- Bug reports
- Feature requests

🚫 Please don't spam!"#
}

/// Digit grouping with commas, e.g. `5000` -> `5,000`.
pub fn format_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Escapes the characters Telegram's legacy Markdown trips over.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '[' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// The fake success receipt. Carrier and country come from the prefix
/// classifier; weekday and time from the injected timestamp.
pub fn airtime_receipt<Tz: TimeZone>(
    phone: &str,
    amount: i64,
    name: &str,
    now: DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let (network, country) = classify(phone);
    format!(
        "💳 Airtime Sent Successfully!\n\
         ┏━━━━━━━━━━━━━━━━━━━━\n\
         │▸ 🪪 Name: {}\n\
         │▸ 📱 Phone: {}\n\
         │▸ 📡 Network: {}\n\
         │▸ 🌍 Country: {}\n\
         │▸ ⭐ Airtime Amount: {}\n\
         │▸ ☀️ Weekday: {}\n\
         │▸ ⏰ Time: {}\n\
         ╰────────────···▸▸\n\n\
         ✅ Thank you for using our Service!\n\
         ▬▬▬▬「 ᴩᴏᴡᴇʀᴇᴅ ʙy 」▬▬▬▬\n\
         \u{2000}\u{2000}\u{2000}• @MEGAHUBBOTS •",
        name,
        phone,
        network,
        country,
        format_thousands(amount),
        now.format("%A"),
        now.format("%I:%M %p"),
    )
}

pub fn progress_header(phone: &str, amount: i64) -> String {
    format!("💸 Sending {} UGX to {}", format_thousands(amount), phone)
}

/// Ten-segment `▰▱` bar with the percentage underneath.
pub fn progress_bar(percent: u32) -> String {
    let percent = percent.min(100);
    let filled = (percent / 10) as usize;
    let mut bar = String::new();
    bar.push('[');
    for _ in 0..filled {
        bar.push('▰');
    }
    for _ in filled..10 {
        bar.push('▱');
    }
    bar.push(']');
    format!("{}\n• Percentage: {}%", bar, percent)
}

pub fn leaderboard_text(entries: &[LeaderboardEntry]) -> String {
    let mut text = String::from("🏆 Top 10 senders\n━━━━━━━━━━━━━━━━━\n");
    for (index, entry) in entries.iter().enumerate() {
        let medal = match index {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "🔹",
        };
        let username = entry
            .username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous");
        text.push_str(&format!(
            "{} {}: {} UGX\n",
            medal,
            escape_markdown(username),
            format_thousands(entry.total_amount)
        ));
    }
    if entries.is_empty() {
        text.push_str("\nLeaderboard is empty! Be the first with /sendairtime");
    }
    text
}

pub fn stats_dashboard(stats: &BotStats) -> String {
    format!(
        "📈 Bot Statistics Dashboard 📈\n\
         ━━━━━━━━━━━━━━━━━━━━━━━\n\
         👥 Users:\n\
         ├─ Total: {}\n\
         └─ Active Today: {}\n\n\
         💸 Transactions:\n\
         ├─ Total: {}\n\
         └─ Total Airtime: {}\n\
         ━━━━━━━━━━━━━━━━━━━━━━━",
        stats.user_count,
        stats.users_joined_today,
        stats.transaction_count,
        format_thousands(stats.total_airtime),
    )
}

pub fn broadcast_progress(total: usize) -> String {
    format!("📤 Broadcasting to {} users...", total)
}

pub fn broadcast_results(success: usize, failures: usize) -> String {
    format!(
        "📊 *Broadcast Results*\n\n\
         ✅ Success: {}\n\
         ❌ Failures: {}\n\
         📩 Total Sent: {}",
        success,
        failures,
        success + failures
    )
}

/// Caption for the admin log channel; the transaction details block is
/// present only for completed sends.
pub fn notification_caption<Tz: TimeZone>(
    user_id: i64,
    username: Option<&str>,
    action: &str,
    transaction: Option<&TransactionRecord>,
    bot_username: Option<&str>,
    now: DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut caption = format!(
        "⭐️ 「User Activity Notification 」⭐️\n\
         ━━━━━━━━━━━━━━━━━━━━━━\n\
         ⊙ 🕵🏻‍♂️ Username: @{}\n\
         ⊙ 🆔 User Id: {}\n\
         ⊙ 📦 Action: {}",
        username.unwrap_or("Not set"),
        user_id,
        action,
    );
    if let Some(txn) = transaction {
        caption.push_str(&format!(
            "\n⊙ 📱 Phone: {}\n⊙ 💸 Amount: {} UGX\n⊙ 🧾 Txn: {}",
            txn.phone_number,
            format_thousands(txn.amount),
            txn.txn_id,
        ));
    }
    caption.push_str(&format!(
        "\n⊙ ⏰ Time: {}\n━━━━━━━━━━━━━━━━━━━━━━\n⊙ 🤖 Bot: @{}",
        now.format("%Y-%m-%d %H:%M:%S"),
        bot_username.unwrap_or("unknown"),
    ));
    caption
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_now() -> DateTime<Utc> {
        // Monday, 2025-06-16 14:30:00 UTC.
        Utc.with_ymd_and_hms(2025, 6, 16, 14, 30, 0).unwrap()
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(5000), "5,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-5000), "-5,000");
    }

    #[test]
    fn markdown_escaping() {
        assert_eq!(escape_markdown("a_b*c[d`e"), "a\\_b\\*c\\[d\\`e");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn receipt_is_deterministic_under_fixed_clock() {
        let receipt = airtime_receipt("+256751722034", 5000, "Alice", fixed_now());
        assert!(receipt.contains("Name: Alice"));
        assert!(receipt.contains("Phone: +256751722034"));
        assert!(receipt.contains("Network: Airtel"));
        assert!(receipt.contains("Country: Uganda 🇺🇬"));
        assert!(receipt.contains("Airtime Amount: 5,000"));
        assert!(receipt.contains("Weekday: Monday"));
        assert!(receipt.contains("Time: 02:30 PM"));

        let again = airtime_receipt("+256751722034", 5000, "Alice", fixed_now());
        assert_eq!(receipt, again);
    }

    #[test]
    fn receipt_degrades_to_unknown() {
        let receipt = airtime_receipt("not-a-number", 100, "Bob", fixed_now());
        assert!(receipt.contains("Network: Unknown"));
        assert!(receipt.contains("Country: Unknown"));
    }

    #[test]
    fn progress_bar_segments() {
        assert_eq!(progress_bar(0), "[▱▱▱▱▱▱▱▱▱▱]\n• Percentage: 0%");
        assert_eq!(progress_bar(40), "[▰▰▰▰▱▱▱▱▱▱]\n• Percentage: 40%");
        assert_eq!(progress_bar(100), "[▰▰▰▰▰▰▰▰▰▰]\n• Percentage: 100%");
        // Clamped rather than overflowing.
        assert_eq!(progress_bar(250), progress_bar(100));
    }

    #[test]
    fn leaderboard_medals_and_escaping() {
        let entries = vec![
            LeaderboardEntry {
                user_id: 1,
                username: Some("top_sender".to_string()),
                total_amount: 10_000,
            },
            LeaderboardEntry {
                user_id: 2,
                username: None,
                total_amount: 5_000,
            },
            LeaderboardEntry {
                user_id: 3,
                username: Some("".to_string()),
                total_amount: 1_000,
            },
            LeaderboardEntry {
                user_id: 4,
                username: Some("fourth".to_string()),
                total_amount: 500,
            },
        ];
        let text = leaderboard_text(&entries);
        assert!(text.contains("🥇 top\\_sender: 10,000 UGX"));
        assert!(text.contains("🥈 Anonymous: 5,000 UGX"));
        assert!(text.contains("🥉 Anonymous: 1,000 UGX"));
        assert!(text.contains("🔹 fourth: 500 UGX"));
    }

    #[test]
    fn empty_leaderboard_hint() {
        let text = leaderboard_text(&[]);
        assert!(text.contains("Leaderboard is empty"));
    }

    #[test]
    fn broadcast_results_sum_to_total() {
        let text = broadcast_results(7, 3);
        assert!(text.contains("Success: 7"));
        assert!(text.contains("Failures: 3"));
        assert!(text.contains("Total Sent: 10"));
    }

    #[test]
    fn notification_caption_with_and_without_transaction() {
        let txn = TransactionRecord {
            id: 1,
            user_id: 42,
            username: Some("alice".to_string()),
            phone_number: "+256751722034".to_string(),
            amount: 5000,
            transaction_date: 0,
            txn_id: "TX123456".to_string(),
        };
        let with = notification_caption(
            42,
            Some("alice"),
            "Sent Airtime",
            Some(&txn),
            Some("airtimebot"),
            fixed_now(),
        );
        assert!(with.contains("@alice"));
        assert!(with.contains("Phone: +256751722034"));
        assert!(with.contains("Amount: 5,000 UGX"));
        assert!(with.contains("Txn: TX123456"));
        assert!(with.contains("2025-06-16 14:30:00"));

        let without = notification_caption(42, None, "Started the bot", None, None, fixed_now());
        assert!(without.contains("@Not set"));
        assert!(without.contains("Action: Started the bot"));
        assert!(!without.contains("Phone:"));
    }
}
