//! Poll cycle orchestration: reload rules, fetch, evaluate, dedup, notify, sleep.
//!
//! One [`Watcher`] owns the seen set and the last good rule snapshot for the
//! life of the process. Cycles never overlap; fetches run one after another.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use tracing::{debug, error, info, warn};

use crate::config::rules::{RuleSet, RuleSource, DEFAULT_POLL_INTERVAL_SECS};
use crate::config::settings::Settings;
use crate::dedup::SeenSet;
use crate::fingerprint::fingerprint;
use crate::ingest::{collect, SourceRegistry};
use crate::notify::Notifier;
use crate::price::parse_price;
use crate::rules::{evaluate, Verdict};

pub const STARTUP_MESSAGE: &str = "✅ listing-watch started.";

/// A failed cycle always waits at least this much longer than a normal one.
pub const COOLDOWN_MARGIN: Duration = Duration::from_secs(60);

/// Pauses that are not part of the rule file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTiming {
    /// After each failed fetch, before the next URL.
    pub fetch_backoff: Duration,
    /// After a cycle-level failure, instead of the poll interval.
    /// Floored at the poll interval plus [`COOLDOWN_MARGIN`].
    pub error_cooldown: Duration,
}

impl Default for WatchTiming {
    fn default() -> Self {
        Self {
            fetch_backoff: Duration::from_secs(2),
            error_cooldown: Duration::from_secs(300),
        }
    }
}

impl WatchTiming {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fetch_backoff: settings.fetch_backoff,
            error_cooldown: settings.error_cooldown,
        }
    }

    /// No pauses at all; handy in tests.
    pub fn immediate() -> Self {
        Self {
            fetch_backoff: Duration::ZERO,
            error_cooldown: Duration::ZERO,
        }
    }
}

/// What one completed cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub listings: usize,
    pub fetched_urls: usize,
    pub failed_urls: usize,
    pub duplicates: usize,
    pub rejected: usize,
    /// Accepted and delivered.
    pub notified: usize,
    /// Accepted, delivery failed, still marked seen.
    pub delivery_failures: usize,
    /// The rule reload failed and the previous snapshot was used.
    pub used_fallback_rules: bool,
    /// Sleep before the next cycle.
    pub interval: Duration,
}

pub struct Watcher {
    rules: Box<dyn RuleSource>,
    registry: SourceRegistry,
    notifier: Arc<dyn Notifier>,
    seen: SeenSet,
    snapshot: Option<RuleSet>,
    timing: WatchTiming,
}

impl Watcher {
    pub fn new(
        rules: Box<dyn RuleSource>,
        registry: SourceRegistry,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rules,
            registry,
            notifier,
            seen: SeenSet::new(),
            snapshot: None,
            timing: WatchTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: WatchTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Last rule set that loaded successfully.
    pub fn snapshot(&self) -> Option<&RuleSet> {
        self.snapshot.as_ref()
    }

    /// Pause after a failed cycle: the configured cooldown, but never shorter
    /// than the current poll interval plus [`COOLDOWN_MARGIN`].
    pub fn failure_cooldown(&self) -> Duration {
        let interval = self
            .snapshot
            .as_ref()
            .map_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), RuleSet::poll_interval);
        self.timing.error_cooldown.max(interval + COOLDOWN_MARGIN)
    }

    async fn reload(&mut self) -> Result<(RuleSet, bool)> {
        match self.rules.load().await {
            Ok(fresh) => {
                self.snapshot = Some(fresh.clone());
                Ok((fresh, false))
            }
            Err(e) => match &self.snapshot {
                Some(previous) => {
                    warn!(
                        target: "watch",
                        source = %self.rules.describe(),
                        error = %format!("{e:#}"),
                        "rule reload failed, keeping previous rules"
                    );
                    Ok((previous.clone(), true))
                }
                None => Err(e.context(format!("loading rules from {}", self.rules.describe()))),
            },
        }
    }

    /// One full pass. Only a rule reload with no fallback snapshot fails it;
    /// fetch and delivery failures are absorbed and counted.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        crate::metrics::ensure_described();
        counter!("watch_cycles_total").increment(1);

        let (rules, used_fallback_rules) = self.reload().await?;
        let outcome = collect(&self.registry, &rules.sources, self.timing.fetch_backoff).await;

        let mut report = CycleReport {
            listings: outcome.listings.len(),
            fetched_urls: outcome.fetched_urls,
            failed_urls: outcome.failed_urls,
            used_fallback_rules,
            interval: rules.poll_interval(),
            ..CycleReport::default()
        };

        for listing in outcome.listings {
            let fp = fingerprint(&listing.url);
            if self.seen.has_seen(&fp) {
                report.duplicates += 1;
                counter!("watch_duplicates_total").increment(1);
                continue;
            }

            let price = listing.price_text.as_deref().and_then(parse_price);
            if let Verdict::Rejected(criterion) = evaluate(&rules, &listing, price) {
                debug!(
                    target: "watch",
                    url = %listing.url,
                    criterion = criterion.as_str(),
                    "rejected"
                );
                report.rejected += 1;
                counter!("watch_rejected_total", "criterion" => criterion.as_str()).increment(1);
                continue;
            }

            match self.notifier.notify(&listing, rules.tag_prefix.as_deref()).await {
                Ok(()) => {
                    info!(
                        target: "watch",
                        platform = %listing.platform,
                        fingerprint = %fp.short(),
                        price = ?price,
                        title = %listing.title,
                        "notified"
                    );
                    report.notified += 1;
                    counter!("watch_notified_total").increment(1);
                }
                Err(e) => {
                    warn!(target: "notify", error = %e, url = %listing.url, "delivery failed");
                    report.delivery_failures += 1;
                    counter!("notify_delivery_errors_total").increment(1);
                }
            }
            // At-most-once: a failed delivery is not retried next cycle.
            self.seen.mark_seen(fp);
        }

        gauge!("watch_seen_fingerprints").set(self.seen.len() as f64);
        gauge!("watch_last_cycle_ts").set(Utc::now().timestamp() as f64);
        Ok(report)
    }

    /// Run one cycle and return how long to sleep before the next.
    pub async fn tick(&mut self) -> Duration {
        match self.run_cycle().await {
            Ok(report) => {
                info!(
                    target: "watch",
                    listings = report.listings,
                    failed_urls = report.failed_urls,
                    duplicates = report.duplicates,
                    rejected = report.rejected,
                    notified = report.notified,
                    delivery_failures = report.delivery_failures,
                    seen = self.seen.len(),
                    "cycle done"
                );
                report.interval
            }
            Err(e) => {
                error!(target: "watch", error = %format!("{e:#}"), "cycle failed");
                counter!("watch_cycle_errors_total").increment(1);
                if let Err(alert_err) = self.notifier.send_text(&format!("⚠️ Bot: {e:#}")).await {
                    warn!(target: "notify", error = %alert_err, "alert delivery failed");
                }
                self.failure_cooldown()
            }
        }
    }

    /// Best-effort "started" message to the channel.
    pub async fn announce_startup(&self) {
        if let Err(e) = self.notifier.send_text(STARTUP_MESSAGE).await {
            warn!(target: "notify", error = %e, "startup message not delivered");
        }
    }

    /// Announce, then cycle forever. Never returns.
    pub async fn run(mut self) {
        info!(
            target: "watch",
            rules = %self.rules.describe(),
            platforms = ?self.registry.platforms(),
            "watcher started"
        );
        self.announce_startup().await;
        loop {
            let pause = self.tick().await;
            debug!(target: "watch", secs = pause.as_secs(), "sleeping");
            tokio::time::sleep(pause).await;
        }
    }
}
