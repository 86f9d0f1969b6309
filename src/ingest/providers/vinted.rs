// src/ingest/providers/vinted.rs
use async_trait::async_trait;

use super::{extract_listings, HttpPageClient, PageLayout, Placement};
use crate::ingest::types::{FetchError, ListingSource, RawListing};

const LAYOUT: PageLayout = PageLayout {
    platform: VintedSource::PLATFORM,
    origin: "https://www.vinted.fr",
    anchor: "a[href*='/items/']",
    price: Placement::Within,
    description: None,
};

pub struct VintedSource {
    http: HttpPageClient,
}

impl VintedSource {
    pub const PLATFORM: &'static str = "vinted";

    pub fn new(http: HttpPageClient) -> Self {
        Self { http }
    }

    pub fn parse_results(html: &str) -> Result<Vec<RawListing>, FetchError> {
        extract_listings(html, &LAYOUT)
    }
}

#[async_trait]
impl ListingSource for VintedSource {
    async fn fetch(&self, search_url: &str) -> Result<Vec<RawListing>, FetchError> {
        let body = self.http.get_text(search_url).await?;
        Self::parse_results(&body)
    }

    fn platform(&self) -> &'static str {
        Self::PLATFORM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_tiles() {
        let page = r#"
<div class="feed-grid">
  <div class="feed-grid__item">
    <a href="/items/4012345678-iphone-13-128-go" class="new-item-box__overlay">
      <img data-src="https://images1.vinted.net/t/01.jpeg">
      <div class="title">iPhone 13 128 Go</div>
      <div class="price"><span>420 €</span></div>
    </a>
  </div>
  <div class="feed-grid__item">
    <a href="https://www.vinted.fr/items/4012345679-coque">Coque</a>
    <p>5,00 €</p>
  </div>
</div>"#;
        let out = VintedSource::parse_results(page).unwrap();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].url, "https://www.vinted.fr/items/4012345678-iphone-13-128-go");
        assert_eq!(out[0].title, "iPhone 13 128 Go 420 €");
        assert_eq!(out[0].price_text.as_deref(), Some("420 €"));
        assert_eq!(out[0].photo_url.as_deref(), Some("https://images1.vinted.net/t/01.jpeg"));
        assert_eq!(out[0].description, None);

        // Price outside the tile link is not picked up.
        assert_eq!(out[1].price_text, None);
        assert_eq!(out[1].platform, "vinted");
    }
}
