use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{DeliveryError, Notifier};
use crate::config::settings::Credentials;

const DEFAULT_API_ROOT: &str = "https://api.telegram.org";
/// Telegram rejects longer photo captions.
const CAPTION_MAX_CHARS: usize = 1024;
const TEXT_MAX_CHARS: usize = 4096;

/// Bot API sink posting to one chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_root: String,
    bot_token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_root", &self.api_root)
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            bot_token: credentials.bot_token.clone(),
            chat_id: credentials.chat_id.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point at another Bot API server (self-hosted, or a local stub in tests).
    pub fn with_api_root(mut self, root: impl Into<String>) -> Self {
        self.api_root = root.into().trim_end_matches('/').to_string();
        self
    }

    async fn call(&self, method: &str, form: &[(&str, &str)]) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/{}", self.api_root, self.bot_token, method);
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.without_url()))?;

        let status = rsp.status();
        if status.is_success() {
            return Ok(());
        }
        // Error bodies look like {"ok":false,"error_code":400,"description":"..."}
        let description = rsp
            .json::<ApiError>()
            .await
            .ok()
            .and_then(|e| e.description)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        Err(DeliveryError::Api {
            status: status.as_u16(),
            description,
        })
    }
}

#[derive(Deserialize)]
struct ApiError {
    description: Option<String>,
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
        let text = truncate_chars(text, TEXT_MAX_CHARS);
        self.call("sendMessage", &[("chat_id", self.chat_id.as_str()), ("text", text)])
            .await
    }

    async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<(), DeliveryError> {
        let caption = truncate_chars(caption, CAPTION_MAX_CHARS);
        self.call(
            "sendPhoto",
            &[("chat_id", self.chat_id.as_str()), ("photo", photo_url), ("caption", caption)],
        )
        .await
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
