//! listing-watch binary entrypoint.
//!
//! `run` polls in the foreground, `serve` adds the liveness endpoint on `$PORT`
//! next to the same worker, `check` validates a rule file and exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use listing_watch::api;
use listing_watch::config::{Credentials, FileRuleSource, RuleSet, Settings};
use listing_watch::ingest::providers::HttpPageClient;
use listing_watch::metrics::Metrics;
use listing_watch::{SourceRegistry, TelegramNotifier, WatchTiming, Watcher};

const DEFAULT_LOG_FILTER: &str = "info,hyper_util=warn,html5ever=warn,selectors=warn";

#[derive(Debug, Parser)]
#[command(name = "listing-watch")]
#[command(about = "Marketplace listing watcher with Telegram notifications")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll forever in the foreground (default).
    Run,
    /// Poll forever and answer liveness probes on $PORT.
    Serve,
    /// Load and validate the rule file, print a summary.
    Check {
        /// Rule file; defaults to $WATCH_CONFIG_PATH or config/watch.json.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Compact logs by default, JSON lines with `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn build_watcher(settings: &Settings, credentials: &Credentials) -> Result<Watcher> {
    let http = HttpPageClient::new(settings.http_timeout)?;
    let notifier = TelegramNotifier::new(credentials).with_timeout(settings.http_timeout);
    Ok(Watcher::new(
        Box::new(FileRuleSource::new(settings.config_path.clone())),
        SourceRegistry::marketplaces(http),
        Arc::new(notifier),
    )
    .with_timing(WatchTiming::from_settings(settings)))
}

fn check(path: PathBuf, settings: &Settings) -> Result<()> {
    let rules = RuleSet::from_path(&path)?;
    let registry = SourceRegistry::marketplaces(HttpPageClient::new(settings.http_timeout)?);

    println!("rule file: {}", path.display());
    for (platform, urls) in &rules.sources {
        let known = registry.get(platform).is_some();
        println!(
            "  {platform}: {} url(s){}",
            urls.len(),
            if known { "" } else { " (no fetcher, ignored)" }
        );
        if !known {
            tracing::warn!(platform = %platform, "no fetcher for platform");
        }
    }
    println!(
        "models={} terms_any={} terms_exclude={} price=[{}..{}] shipping={} interval={}s tag={}",
        rules.models.len(),
        rules.terms_any.len(),
        rules.terms_exclude.len(),
        rules.price_min.map_or("-".to_string(), |p| p.to_string()),
        rules.price_max.map_or("-".to_string(), |p| p.to_string()),
        rules.require_shipping,
        rules.poll_interval_seconds,
        rules.tag_prefix.as_deref().unwrap_or("-"),
    );
    if rules.url_count() == 0 {
        tracing::warn!("rule file configures no search URLs; cycles will be empty");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("reading settings from environment")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Check { config } => check(config.unwrap_or(settings.config_path.clone()), &settings),
        Commands::Run => {
            let credentials = Credentials::from_env()?;
            build_watcher(&settings, &credentials)?.run().await;
            Ok(())
        }
        Commands::Serve => {
            let credentials = Credentials::from_env()?;
            let watcher = build_watcher(&settings, &credentials)?;
            let metrics = if settings.metrics_enabled {
                Some(Metrics::install()?)
            } else {
                None
            };
            let router = api::router(metrics.as_ref());

            // Own task, so a busy cycle never stalls the liveness accept loop.
            let worker = tokio::spawn(watcher.run());
            tokio::select! {
                res = api::serve(settings.port, router) => res,
                joined = worker => {
                    joined.context("watcher task ended")?;
                    Ok(())
                }
            }
        }
    }
}
