// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod dedup;
pub mod fingerprint;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod notify;
pub mod price;
pub mod rules;
pub mod watcher;

// ---- Re-exports for stable public API ----
pub use crate::config::{FileRuleSource, RuleSet, RuleSource};
pub use crate::dedup::SeenSet;
pub use crate::fingerprint::{fingerprint, Fingerprint};
pub use crate::ingest::types::{FetchError, ListingSource, RawListing};
pub use crate::ingest::SourceRegistry;
pub use crate::normalize::normalize;
pub use crate::notify::{DeliveryError, Notifier, TelegramNotifier};
pub use crate::price::parse_price;
pub use crate::rules::{evaluate, Criterion, Verdict};
pub use crate::watcher::{CycleReport, WatchTiming, Watcher};
