// src/notify/mod.rs
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::ingest::types::RawListing;
use crate::normalize::normalize;
use crate::price::parse_price;

pub use telegram::TelegramNotifier;

const UNTITLED: &str = "(Sans titre)";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api rejected message ({status}): {description}")]
    Api { status: u16, description: String },
}

/// Single fixed destination channel. Callers log failures; nothing is retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError>;
    async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<(), DeliveryError>;

    /// Photo with the rendered message as caption when the listing has one,
    /// plain text otherwise.
    async fn notify(&self, listing: &RawListing, tag: Option<&str>) -> Result<(), DeliveryError> {
        let msg = render_listing_message(listing, tag);
        match listing.photo_url.as_deref() {
            Some(photo) => self.send_photo(photo, &msg).await,
            None => self.send_text(&msg).await,
        }
    }
}

/// ```text
/// [tag ]📱 iPhone 12 64Go
/// 💶 250 €
/// 🔗 https://www.leboncoin.fr/vi/123.htm
/// ```
pub fn render_listing_message(listing: &RawListing, tag: Option<&str>) -> String {
    let prefix = tag.map(|t| format!("{t} ")).unwrap_or_default();
    let title = match listing.title.trim() {
        "" => UNTITLED,
        t => t,
    };
    let price = listing
        .price_text
        .as_deref()
        .and_then(parse_price)
        .map(|p| format!("{p} €"))
        .unwrap_or_else(|| "?".to_string());

    format!(
        "{prefix}{icon} {title}\n💶 {price}\n🔗 {url}",
        icon = listing_icon(&listing.title),
        url = listing.url
    )
}

fn listing_icon(title: &str) -> &'static str {
    if normalize(title).contains("iphone") {
        "📱"
    } else {
        "📟"
    }
}
