// src/config/settings.rs
//! Process-level settings read from the environment (after `.env`, if any).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::rules::DEFAULT_RULES_PATH;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_FETCH_BACKOFF: &str = "FETCH_BACKOFF_SECS";
pub const ENV_ERROR_COOLDOWN: &str = "ERROR_COOLDOWN_SECS";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

const DEFAULT_PORT: u16 = 10_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_FETCH_BACKOFF_SECS: u64 = 2;
const DEFAULT_ERROR_COOLDOWN_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("missing required env var {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Bot credential pair for the notification channel. Required to start the watcher.
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Token never reaches logs.
        f.debug_struct("Credentials")
            .field("bot_token", &format_args!("<{} chars>", self.bot_token.len()))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StartupError> {
        let bot_token = required(&lookup, ENV_BOT_TOKEN)?;
        let chat_id = required(&lookup, ENV_CHAT_ID)?;
        Ok(Self { bot_token, chat_id })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub port: u16,
    pub http_timeout: Duration,
    pub fetch_backoff: Duration,
    pub error_cooldown: Duration,
    pub metrics_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_RULES_PATH),
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            fetch_backoff: Duration::from_secs(DEFAULT_FETCH_BACKOFF_SECS),
            error_cooldown: Duration::from_secs(DEFAULT_ERROR_COOLDOWN_SECS),
            metrics_enabled: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StartupError> {
        let d = Self::default();
        Ok(Self {
            config_path: optional(&lookup, ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or(d.config_path),
            port: parsed(&lookup, ENV_PORT)?.unwrap_or(d.port),
            http_timeout: parsed(&lookup, ENV_HTTP_TIMEOUT)?
                .map(Duration::from_secs)
                .unwrap_or(d.http_timeout),
            fetch_backoff: parsed(&lookup, ENV_FETCH_BACKOFF)?
                .map(Duration::from_secs)
                .unwrap_or(d.fetch_backoff),
            error_cooldown: parsed(&lookup, ENV_ERROR_COOLDOWN)?
                .map(Duration::from_secs)
                .unwrap_or(d.error_cooldown),
            metrics_enabled: optional(&lookup, ENV_METRICS_ENABLED).is_some_and(|v| v == "1"),
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Option<String> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, StartupError> {
    optional(lookup, var).ok_or(StartupError::MissingEnv(var))
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, StartupError> {
    match optional(lookup, var) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| StartupError::InvalidEnv { var, value }),
    }
}
