// src/ingest/providers/mod.rs
//! Marketplace fetchers and the shared HTML extraction they are built on.

pub mod leboncoin;
pub mod vinted;

use std::time::Duration;

use anyhow::Context;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::types::{FetchError, RawListing};

const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// GET-only client shared by all fetchers. Every request ends within `timeout`.
#[derive(Debug, Clone)]
pub struct HttpPageClient {
    client: reqwest::Client,
}

impl HttpPageClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_UA)
            .timeout(timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }

    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Where a field sits relative to a result's anchor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Inside the anchor.
    Within,
    /// Anywhere after the anchor's start tag in document order (own children first).
    Following,
}

/// How one marketplace lays out its search-result page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageLayout {
    pub platform: &'static str,
    /// Prepended to site-relative hrefs.
    pub origin: &'static str,
    /// One match per result, must carry `href`.
    pub anchor: &'static str,
    pub price: Placement,
    /// `None`: the page shows no description.
    pub description: Option<Placement>,
}

/// Extract one [`RawListing`] per result anchor of `layout`.
pub(crate) fn extract_listings(html: &str, layout: &PageLayout) -> Result<Vec<RawListing>, FetchError> {
    let document = Html::parse_document(html);
    let anchor_sel = selector(layout.anchor)?;
    let img_sel = selector("img")?;

    let mut out = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            continue;
        };
        let url = if href.starts_with('/') {
            format!("{}{}", layout.origin, href)
        } else {
            href.to_string()
        };

        let price_text = find_element(&document, anchor, layout.price, |el| {
            matches!(el.value().name(), "span" | "div") && el.text().any(|t| t.contains('€'))
        })
        .map(element_text);

        let description = layout.description.and_then(|placement| {
            find_element(&document, anchor, placement, |el| el.value().name() == "p")
                .map(element_text)
                .filter(|d| !d.is_empty())
        });

        let photo_url = anchor.select(&img_sel).next().and_then(|img| {
            ["src", "data-src"]
                .iter()
                .filter_map(|a| img.value().attr(a))
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string)
        });

        out.push(RawListing {
            title: element_text(anchor),
            price_text,
            url,
            photo_url,
            description,
            platform: layout.platform.to_string(),
        });
    }
    Ok(out)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("selector {css:?}: {e}")))
}

/// Visible text: trimmed text nodes joined by single spaces.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_element<'a>(
    document: &'a Html,
    anchor: ElementRef<'a>,
    placement: Placement,
    pred: impl Fn(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    match placement {
        Placement::Within => anchor
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| pred(el)),
        Placement::Following => document
            .root_element()
            .descendants()
            .skip_while(|n| n.id() != anchor.id())
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| pred(el)),
    }
}
