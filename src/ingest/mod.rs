// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use metrics::counter;

use crate::ingest::providers::{
    leboncoin::LeboncoinSource, vinted::VintedSource, HttpPageClient,
};
use crate::ingest::types::{ListingSource, RawListing};

/// Fetchers by platform id.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn ListingSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in marketplaces sharing one HTTP client.
    pub fn marketplaces(http: HttpPageClient) -> Self {
        Self::new()
            .with_source(LeboncoinSource::new(http.clone()))
            .with_source(VintedSource::new(http))
    }

    pub fn with_source(mut self, source: impl ListingSource + 'static) -> Self {
        self.register(Box::new(source));
        self
    }

    /// Registers `source` under its platform id, replacing any previous one.
    pub fn register(&mut self, source: Box<dyn ListingSource>) {
        self.sources.insert(source.platform().to_string(), source);
    }

    pub fn get(&self, platform: &str) -> Option<&dyn ListingSource> {
        self.sources.get(platform).map(|s| s.as_ref())
    }

    pub fn platforms(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// In fetch order: platforms in key order, URLs in configured order.
    pub listings: Vec<RawListing>,
    pub fetched_urls: usize,
    pub failed_urls: usize,
    pub unknown_platforms: Vec<String>,
}

/// Fetch every configured URL sequentially.
///
/// A failing URL is logged, followed by a `backoff` pause, and skipped;
/// the remaining URLs and platforms are still fetched.
pub async fn collect(
    registry: &SourceRegistry,
    sources: &BTreeMap<String, Vec<String>>,
    backoff: Duration,
) -> CollectOutcome {
    crate::metrics::ensure_described();

    let mut out = CollectOutcome::default();
    for (platform, urls) in sources {
        let Some(source) = registry.get(platform) else {
            tracing::warn!(target: "ingest", platform = %platform, "no fetcher for platform, skipping");
            out.unknown_platforms.push(platform.clone());
            continue;
        };

        for url in urls {
            match source.fetch(url).await {
                Ok(mut listings) => {
                    tracing::debug!(
                        target: "ingest",
                        platform = %platform,
                        url = %url,
                        count = listings.len(),
                        "fetched"
                    );
                    counter!("ingest_listings_total", "platform" => platform.clone())
                        .increment(listings.len() as u64);
                    out.fetched_urls += 1;
                    out.listings.append(&mut listings);
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = %e, platform = %platform, url = %url, "fetch failed");
                    counter!("ingest_source_errors_total", "platform" => platform.clone()).increment(1);
                    out.failed_urls += 1;
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FetchError;
    use async_trait::async_trait;

    struct Fixed(&'static str, usize);

    #[async_trait]
    impl ListingSource for Fixed {
        async fn fetch(&self, search_url: &str) -> Result<Vec<RawListing>, FetchError> {
            if search_url.contains("down") {
                return Err(FetchError::HttpStatus {
                    status: 503,
                    url: search_url.to_string(),
                });
            }
            Ok((0..self.1)
                .map(|i| RawListing {
                    title: format!("ad {i}"),
                    price_text: None,
                    url: format!("{search_url}/{i}"),
                    photo_url: None,
                    description: None,
                    platform: self.0.to_string(),
                })
                .collect())
        }
        fn platform(&self) -> &'static str {
            self.0
        }
    }

    #[tokio::test]
    async fn failing_url_is_isolated() {
        let registry = SourceRegistry::new().with_source(Fixed("a", 2)).with_source(Fixed("b", 1));
        let mut sources = BTreeMap::new();
        sources.insert(
            "a".to_string(),
            vec!["https://a/1".to_string(), "https://a/down".to_string()],
        );
        sources.insert("b".to_string(), vec!["https://b/1".to_string()]);
        sources.insert("zzz".to_string(), vec!["https://z/1".to_string()]);

        let out = collect(&registry, &sources, Duration::ZERO).await;
        assert_eq!(out.fetched_urls, 2);
        assert_eq!(out.failed_urls, 1);
        assert_eq!(out.unknown_platforms, vec!["zzz".to_string()]);
        let urls: Vec<&str> = out.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a/1/0", "https://a/1/1", "https://b/1/0"]);
    }

    #[test]
    fn registry_lists_platforms_sorted() {
        let registry = SourceRegistry::new().with_source(Fixed("vinted", 0)).with_source(Fixed("leboncoin", 0));
        assert_eq!(registry.platforms(), vec!["leboncoin", "vinted"]);
        assert!(registry.get("ebay").is_none());
    }
}
