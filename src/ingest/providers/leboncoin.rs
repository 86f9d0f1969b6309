// src/ingest/providers/leboncoin.rs
use async_trait::async_trait;

use super::{extract_listings, HttpPageClient, PageLayout, Placement};
use crate::ingest::types::{FetchError, ListingSource, RawListing};

const LAYOUT: PageLayout = PageLayout {
    platform: LeboncoinSource::PLATFORM,
    origin: "https://www.leboncoin.fr",
    anchor: "a[href*='/vi/']",
    // Price and teaser paragraph are rendered after the ad link.
    price: Placement::Following,
    description: Some(Placement::Following),
};

pub struct LeboncoinSource {
    http: HttpPageClient,
}

impl LeboncoinSource {
    pub const PLATFORM: &'static str = "leboncoin";

    pub fn new(http: HttpPageClient) -> Self {
        Self { http }
    }

    pub fn parse_results(html: &str) -> Result<Vec<RawListing>, FetchError> {
        extract_listings(html, &LAYOUT)
    }
}

#[async_trait]
impl ListingSource for LeboncoinSource {
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

    const PAGE: &str = r#"
<html><body>
  <div data-qa-id="aditem_container">
    <a href="/vi/2456789012.htm" data-test-id="ad">
      <img src="https://img.leboncoin.fr/api/v1/lbcpb1/images/aa/bb/cc.jpg" alt="">
      <span data-qa-id="aditem_title">iPhone 12 64Go Bleu</span>
    </a>
    <div><span data-qa-id="aditem_price">250&nbsp;€</span></div>
    <p>Paris 75011 · Envoi possible</p>
  </div>
  <div data-qa-id="aditem_container">
    <a href="https://www.leboncoin.fr/vi/2456789013.htm">
      <span>iPhone 12 écran cassé</span>
    </a>
    <span>90 €</span>
  </div>
  <a href="/recherche?page=2">Page suivante</a>
</body></html>"#;

    #[test]
    fn parses_result_cards() {
        let out = LeboncoinSource::parse_results(PAGE).unwrap();
        assert_eq!(out.len(), 2, "pagination link is not an ad");

        let first = &out[0];
        assert_eq!(first.url, "https://www.leboncoin.fr/vi/2456789012.htm");
        assert_eq!(first.title, "iPhone 12 64Go Bleu");
        assert_eq!(first.price_text.as_deref(), Some("250\u{a0}€"));
        assert_eq!(
            first.photo_url.as_deref(),
            Some("https://img.leboncoin.fr/api/v1/lbcpb1/images/aa/bb/cc.jpg")
        );
        assert_eq!(first.description.as_deref(), Some("Paris 75011 · Envoi possible"));
        assert_eq!(first.platform, "leboncoin");

        let second = &out[1];
        assert_eq!(second.url, "https://www.leboncoin.fr/vi/2456789013.htm");
        assert_eq!(second.price_text.as_deref(), Some("90 €"));
        assert_eq!(second.photo_url, None);
        assert_eq!(second.description, None);
    }
}
