// src/ingest/types.rs
use async_trait::async_trait;
use thiserror::Error;

/// One ad as scraped from a search-result page.
///
/// `url` is the identity: two records with the same URL are the same ad,
/// whatever their scraped text says.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawListing {
    pub title: String,              // may be empty
    pub price_text: Option<String>, // e.g. "1 200 €", parsed later
    pub url: String,
    pub photo_url: Option<String>,
    pub description: Option<String>,
    pub platform: String, // e.g. "leboncoin", "vinted"
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("page extraction failed: {0}")]
    Parse(String),
}

/// A marketplace fetcher: one search-result URL in, raw listings out.
///
/// Zero results is `Ok(vec![])`, never an error.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, search_url: &str) -> Result<Vec<RawListing>, FetchError>;
    fn platform(&self) -> &'static str;
}
