// src/config/rules.rs
//! Rule file schema and loading.
//!
//! The file is reread on every poll cycle, so edits apply without restart.
//! Supported formats: JSON and TOML (picked by extension, sniffed otherwise).
//!
//! ```json
//! {
//!   "sources": { "leboncoin": ["https://www.leboncoin.fr/recherche?text=iphone"] },
//!   "models": ["iphone 12", "iphone 13"],
//!   "price_min": 100, "price_max": 300,
//!   "require_shipping": true,
//!   "shipping_positive": ["envoi possible"], "shipping_negative": ["remise en main propre uniquement"],
//!   "terms_any": [["64go", "64 gb"], ["128go"]],
//!   "terms_exclude": ["cassé", "icloud"],
//!   "tag_prefix": "[A]",
//!   "poll_interval_seconds": 180
//! }
//! ```
//!
//! Older files with per-platform blocks (`"vinted": {"base_urls": [...]}`),
//! a `platforms` allow-list or `search_interval_seconds` are still accepted.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_RULES_PATH: &str = "config/watch.json";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 180;

/// Immutable snapshot of the user's matching criteria for one cycle.
///
/// Every field defaults to "no constraint": an empty `RuleSet` accepts all
/// listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    /// Platform id -> search-result URLs, polled in key order.
    pub sources: BTreeMap<String, Vec<String>>,
    pub models: Vec<String>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub require_shipping: bool,
    pub shipping_positive: Vec<String>,
    pub shipping_negative: Vec<String>,
    pub terms_any: Vec<Vec<String>>,
    pub terms_exclude: Vec<String>,
    pub tag_prefix: Option<String>,
    pub poll_interval_seconds: u64,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            sources: BTreeMap::new(),
            models: Vec::new(),
            price_min: None,
            price_max: None,
            require_shipping: false,
            shipping_positive: Vec::new(),
            shipping_negative: Vec::new(),
            terms_any: Vec::new(),
            terms_exclude: Vec::new(),
            tag_prefix: None,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl RuleSet {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule file {}", path.display()))?;
        parse_rules(&content, extension_of(path))
            .with_context(|| format!("parsing rule file {}", path.display()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        parse_rules(s, "json")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        parse_rules(s, "toml")
    }

    /// Total number of configured search URLs across platforms.
    pub fn url_count(&self) -> usize {
        self.sources.values().map(Vec::len).sum()
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Where the rule set comes from. Read fresh on every cycle.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn load(&self) -> Result<RuleSet>;
    fn describe(&self) -> String;
}

/// Rule file on local disk.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    async fn load(&self) -> Result<RuleSet> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading rule file {}", self.path.display()))?;
        parse_rules(&content, extension_of(&self.path))
            .with_context(|| format!("parsing rule file {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(|s| s.to_str()).unwrap_or_default()
}

// --- raw file schema ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RuleFile {
    sources: BTreeMap<String, Vec<String>>,
    leboncoin: Option<PlatformBlock>,
    vinted: Option<PlatformBlock>,
    platforms: Option<Vec<String>>,
    models: Vec<String>,
    price_min: Option<u64>,
    price_max: Option<u64>,
    require_shipping: bool,
    shipping_positive: Vec<String>,
    shipping_negative: Vec<String>,
    terms_any: Vec<Vec<String>>,
    terms_exclude: Vec<String>,
    tag_prefix: Option<String>,
    #[serde(alias = "search_interval_seconds")]
    poll_interval_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlatformBlock {
    base_urls: Vec<String>,
}

fn parse_rules(s: &str, hint_ext: &str) -> Result<RuleSet> {
    let file: RuleFile = match hint_ext.to_ascii_lowercase().as_str() {
        "toml" => toml::from_str(s).context("invalid TOML rule file")?,
        "json" => serde_json::from_str(s).context("invalid JSON rule file")?,
        _ => match serde_json::from_str(s) {
            Ok(v) => v,
            Err(json_err) => toml::from_str(s).map_err(|toml_err| {
                anyhow::anyhow!("unsupported rule file format (json: {json_err}; toml: {toml_err})")
            })?,
        },
    };
    file.into_rule_set()
}

impl RuleFile {
    fn into_rule_set(self) -> Result<RuleSet> {
        let mut sources: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (platform, urls) in self.sources {
            sources
                .entry(platform.trim().to_ascii_lowercase())
                .or_default()
                .extend(urls);
        }
        for (platform, block) in [("leboncoin", self.leboncoin), ("vinted", self.vinted)] {
            if let Some(block) = block {
                sources
                    .entry(platform.to_string())
                    .or_default()
                    .extend(block.base_urls);
            }
        }
        if let Some(allowed) = &self.platforms {
            sources.retain(|platform, _| allowed.iter().any(|a| a.eq_ignore_ascii_case(platform)));
        }
        for urls in sources.values_mut() {
            *urls = clean_urls(std::mem::take(urls));
        }
        sources.retain(|platform, urls| !platform.is_empty() && !urls.is_empty());

        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                bail!("price_min ({min}) is greater than price_max ({max})");
            }
        }

        let tag_prefix = self
            .tag_prefix
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(RuleSet {
            sources,
            models: self.models,
            price_min: self.price_min,
            price_max: self.price_max,
            require_shipping: self.require_shipping,
            shipping_positive: self.shipping_positive,
            shipping_negative: self.shipping_negative,
            terms_any: self.terms_any,
            terms_exclude: self.terms_exclude,
            tag_prefix,
            poll_interval_seconds: self
                .poll_interval_seconds
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
        })
    }
}

/// Trim, drop empties and exact duplicates, keep first-seen order.
fn clean_urls(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|u| u == t) {
            out.push(t.to_string());
        }
    }
    out
}
