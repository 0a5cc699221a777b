//! Hand-off of saved records to the dispenser device
//!
//! The device transport is pluggable. `LogNotifier` only records that a
//! record is ready; `WebhookNotifier` POSTs it as JSON to a configured URL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use dispenser_common::{PersistedRecord, UserId};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Message sent to the device after a record is persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNotification {
    pub user_id: UserId,
    pub saved_to: String,
    pub record: PersistedRecord,
}

/// Invoked once per successful registration
#[async_trait]
pub trait DeviceNotifier: Send + Sync {
    async fn notify(&self, notification: &DeviceNotification) -> Result<()>;
}

/// Default notifier used when no device endpoint is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl DeviceNotifier for LogNotifier {
    async fn notify(&self, notification: &DeviceNotification) -> Result<()> {
        info!(
            "Record {} ready to send to dispenser ({} schedules)",
            notification.user_id,
            notification.record.schedules.len()
        );
        Ok(())
    }
}

/// Delivers notifications to an HTTP endpoint on the device
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DeviceNotifier for WebhookNotifier {
    async fn notify(&self, notification: &DeviceNotification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(notification)
            .send()
            .await
            .with_context(|| format!("Failed to reach device webhook {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("Device webhook returned {}", response.status());
        }

        info!(
            "Sent record {} to device webhook {}",
            notification.user_id, self.url
        );
        Ok(())
    }
}
