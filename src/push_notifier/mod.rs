//! PushNotifier - ServerChan push delivery
//!
//! ## Responsibilities
//!
//! - Resolve the delivery URL from a send key
//! - POST title/description (plus extra options) as JSON
//!
//! Delivery is best-effort: transport failures are logged, never returned.
//! Only a malformed `sctp` key is reported as an error.

use crate::error::{Error, Result};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Prefix of per-account keys (`sctp<digits>t...`)
const ACCOUNT_KEY_PREFIX: &str = "sctp";
const ACCOUNT_KEY_TERMINATOR: char = 't';
const DEFAULT_TAGS: &str = "web push";

/// Account number embedded in a `sctp<digits>t` key, `None` for generic keys
fn account_number(key: &str) -> Result<Option<&str>> {
    let Some(rest) = key.strip_prefix(ACCOUNT_KEY_PREFIX) else {
        return Ok(None);
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (digits, tail) = rest.split_at(digits_len);
    if digits.is_empty() || !tail.starts_with(ACCOUNT_KEY_TERMINATOR) {
        return Err(Error::Config("Invalid sendkey format for sctp".to_string()));
    }

    Ok(Some(digits))
}

/// Delivery URL for `key`
pub fn resolve_url(key: &str) -> Result<String> {
    Ok(match account_number(key)? {
        Some(num) => format!("https://{}.push.ft07.com/send/{}.send", num, key),
        None => format!("https://sctapi.ftqq.com/{}.send", key),
    })
}

/// PushNotifier instance
pub struct PushNotifier {
    client: reqwest::Client,
    default_key: String,
    /// Replaces the resolved host (used against local mock servers)
    base_url: Option<String>,
}

impl PushNotifier {
    /// Create new PushNotifier
    pub fn new(default_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            default_key: default_key.into(),
            base_url: None,
        }
    }

    /// Send every notification to `base_url/<key>.send` instead of the public endpoints
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn url_for(&self, key: &str) -> Result<String> {
        match &self.base_url {
            Some(base) => {
                account_number(key)?;
                Ok(format!("{}/{}.send", base.trim_end_matches('/'), key))
            }
            None => resolve_url(key),
        }
    }

    /// Send one notification. An empty `key` uses the configured default,
    /// and nothing is sent when that is empty too. `options` defaults to
    /// `{"tags": "web push"}`.
    pub async fn send(
        &self,
        key: &str,
        title: &str,
        desp: &str,
        options: Option<Map<String, Value>>,
    ) -> Result<()> {
        let key = if key.is_empty() { self.default_key.as_str() } else { key };
        if key.is_empty() {
            tracing::warn!(title = %title, "No send key configured, push skipped");
            return Ok(());
        }
        let url = self.url_for(key)?;

        let mut body = json!({
            "title": title,
            "desp": desp,
        });
        let options = options.unwrap_or_else(|| {
            let mut m = Map::new();
            m.insert("tags".to_string(), Value::from(DEFAULT_TAGS));
            m
        });
        if let Value::Object(fields) = &mut body {
            fields.extend(options);
        }

        match self.client.post(&url).json(&body).send().await {
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                if status.is_success() {
                    tracing::info!(status = %status, response = %text, "Push notification sent");
                } else {
                    tracing::warn!(status = %status, response = %text, "Push notification rejected");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Push notification failed");
            }
        }

        Ok(())
    }
}
