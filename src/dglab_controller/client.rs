//! DG-LAB game API client
//!
//! Form-encoded POSTs against the controller's `/api/v2/game/all/*` endpoints.

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

const FIRE_PATH: &str = "/api/v2/game/all/action/fire";
const STRENGTH_PATH: &str = "/api/v2/game/all/strength";

/// DG-LAB controller client
pub struct DglabClient {
    client: Client,
}

impl DglabClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .no_proxy()
                .build()
                .unwrap_or_default(),
        }
    }

    /// One fire action lasting `duration` seconds
    pub async fn fire(&self, base_url: &str, strength: u32, duration: u64) -> Result<String> {
        let form = [
            ("strength", strength.to_string()),
            ("time", duration.saturating_mul(1000).to_string()),
            ("override", "true".to_string()),
        ];
        tracing::info!(strength = strength, time_ms = duration.saturating_mul(1000), "DG-LAB fire");
        self.post(base_url, FIRE_PATH, &form).await
    }

    /// Set the absolute strength (`"0"` resets)
    pub async fn set_strength(&self, base_url: &str, strength: &str) -> Result<String> {
        tracing::info!(strength = %strength, "DG-LAB set strength");
        self.post(base_url, STRENGTH_PATH, &[("strength.set", strength.to_string())])
            .await
    }

    async fn post(&self, base_url: &str, path: &str, form: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("DG-LAB request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "DG-LAB request rejected");
            return Err(Error::Upstream(format!(
                "DG-LAB {} failed with status {}: {}",
                path, status, body
            )));
        }

        tracing::debug!(url = %url, body = %body, "DG-LAB response");
        Ok(body)
    }
}

impl Default for DglabClient {
    fn default() -> Self {
        Self::new()
    }
}
