//! Rendering of notification text.
//!
//! One [`Message`] carries every rendition; each channel picks the one its
//! medium can display.

use carwatch_extract::Listing;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Email subject and desktop title.
    pub title: String,
    /// Single line for the desktop body.
    pub short: String,
    /// Slack-style markup for the webhook.
    pub markup: String,
    /// Plain text for the email body.
    pub plain: String,
}

impl Message {
    pub fn new_listings(listings: &[Listing], search_url: &str, at: OffsetDateTime) -> Self {
        let count = listings.len();
        let title = format!("{count} new listing{}", plural(count));
        let sent_at = timestamp(at);

        let mut markup = format!("🚗 *{title} found*\n");
        let mut plain = format!("{title} found.\n\n");
        for listing in listings {
            let badge = if listing.site_marked_new { " 🆕" } else { "" };
            let year = listing.year.as_deref().unwrap_or("year unknown");
            markup.push_str(&format!("• *{}*{badge}\n  💰 {}\n  📅 {year}\n", listing.name, listing.price));
            let badge = if listing.site_marked_new { " [NEW]" } else { "" };
            plain.push_str(&format!(
                "Name: {}{badge}\nPrice: {}\nYear: {year}\nDetected: {}\n\n",
                listing.name,
                listing.price,
                timestamp(listing.detected_at),
            ));
        }
        markup.push_str(&format!("\n🔗 <{search_url}|Open search results>\n⏰ {sent_at}"));
        plain.push_str(&format!("Search results: {search_url}\n"));

        let short = match listings {
            [] => title.clone(),
            [only] => format!("{} - {}", only.name, only.price),
            [first, rest @ ..] => format!("{} - {} (+{} more)", first.name, first.price, rest.len()),
        };
        Self { title, short, markup, plain }
    }

    /// Heartbeat sent after a cycle with nothing to report.
    pub fn status(known: usize, search_url: &str, at: OffsetDateTime) -> Self {
        let title = "Check complete".to_string();
        let short = format!("No new listings ({known} known)");
        let markup = format!("✅ *{title}*: no new listings, {known} known\n🔗 <{search_url}|Open search results>\n⏰ {}", timestamp(at));
        let plain = format!("{title}: no new listings, {known} known.\nSearch results: {search_url}\n");
        Self { title, short, markup, plain }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(TIMESTAMP).unwrap_or_else(|_| at.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn listing(name: &str, price: &str, site_marked_new: bool) -> Listing {
        Listing {
            name: name.to_string(),
            price: price.to_string(),
            year: Some("2020(R02)年".to_string()),
            site_marked_new,
            detected_at: datetime!(2025-06-01 09:00 +9),
            source_url: "https://example.com/search".to_string(),
        }
    }

    #[test]
    fn single_listing() {
        let at = datetime!(2025-06-01 09:05:30 +9);
        let message = Message::new_listings(&[listing("プリウス S", "153.7万円", true)], "https://example.com/search", at);
        assert_eq!(message.title, "1 new listing");
        assert_eq!(message.short, "プリウス S - 153.7万円");
        assert!(message.markup.contains("• *プリウス S* 🆕\n  💰 153.7万円\n  📅 2020(R02)年\n"));
        assert!(message.markup.ends_with("⏰ 2025-06-01 09:05:30 +09:00"));
        assert!(message.plain.contains("Name: プリウス S [NEW]\nPrice: 153.7万円\n"));
        assert!(message.plain.contains("Detected: 2025-06-01 09:00:00 +09:00"));
        assert!(message.plain.ends_with("Search results: https://example.com/search\n"));
    }

    #[test]
    fn several_listings_are_summarised() {
        let listings = [
            listing("プリウス A", "150万円", false),
            listing("プリウス S", "140万円", false),
            listing("プリウス Z", "159万円", false),
        ];
        let message = Message::new_listings(&listings, "https://example.com/", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(message.title, "3 new listings");
        assert_eq!(message.short, "プリウス A - 150万円 (+2 more)");
        assert!(!message.markup.contains('🆕'));
        assert_eq!(message.plain.matches("Name: ").count(), 3);
    }

    #[test]
    fn status_message() {
        let message = Message::status(42, "https://example.com/", OffsetDateTime::UNIX_EPOCH);
        assert!(message.markup.contains("42 known"));
        assert_eq!(message.short, "No new listings (42 known)");
    }
}
