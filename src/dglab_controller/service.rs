//! DG-LAB actuation service
//!
//! Runs one actuation inside the calling request, then pushes a notification.
//! Timed mode holds the request for the whole duration; there is no
//! mid-flight cancellation.

use super::client::DglabClient;
use super::types::*;
use crate::error::Result;
use crate::push_notifier::PushNotifier;
use crate::state_store::StateStore;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const NOTIFY_TITLE: &str = "Status page push";
const MESSAGE_SENT: &str = "Message sent";

/// DG-LAB orchestration service
pub struct DglabService {
    store: Arc<StateStore>,
    notifier: Arc<PushNotifier>,
    client: DglabClient,
}

impl DglabService {
    pub fn new(store: Arc<StateStore>, notifier: Arc<PushNotifier>) -> Self {
        Self {
            store,
            notifier,
            client: DglabClient::new(),
        }
    }

    /// Handle one button press and return the plain-text result.
    ///
    /// Actuator failures are reported in the text, never as an error.
    pub async fn trigger(&self) -> String {
        let settings = self.store.dglab_settings().await;

        let outcome = match self.actuate(&settings).await {
            Ok(()) => ActuationOutcome::Succeeded {
                strength: settings.strength,
                duration: settings.duration,
            },
            Err(e) => {
                tracing::error!(error = %e, "DG-LAB actuation failed");
                ActuationOutcome::Failed {
                    reason: e.message(),
                }
            }
        };

        let message = format!(
            "Someone poked you\nDG-LAB status: {}",
            outcome.status_text()
        );
        if let Err(e) = self.notifier.send("", NOTIFY_TITLE, &message, None).await {
            tracing::warn!(error = %e, "Push notification not sent");
        }

        let report = outcome.report();
        tracing::info!(success = outcome.is_success(), "{}\n{}", MESSAGE_SENT, report);
        format!("{}\n{}", MESSAGE_SENT, report)
    }

    async fn actuate(&self, settings: &DglabSettings) -> Result<()> {
        match settings.mode() {
            ActuationMode::Fire => {
                let body = self
                    .client
                    .fire(&settings.url, settings.strength, settings.duration)
                    .await?;
                tracing::info!(response = %body, "DG-LAB fire done");
            }
            ActuationMode::Timed => {
                self.client
                    .set_strength(&settings.url, &settings.strength.to_string())
                    .await?;
                sleep(Duration::from_secs(settings.duration)).await;
                let body = self.client.set_strength(&settings.url, "0").await?;
                tracing::info!(response = %body, "DG-LAB strength reset");
            }
        }
        Ok(())
    }
}
