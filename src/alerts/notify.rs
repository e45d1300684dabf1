use super::models::{Alert, AlertState};
use async_trait::async_trait;
use std::time::Duration;

/// Delivery channel for alert transitions. Called once when an alert
/// fires and once when it resolves; pending alerts are not delivered.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Writes transitions to the log stream. Always registered so firing
/// alerts are visible even with no external channel configured.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        match alert.state {
            AlertState::Resolved => {
                tracing::info!(
                    rule = %alert.rule_name,
                    severity = ?alert.severity,
                    "Alert resolved"
                );
            }
            _ => {
                tracing::warn!(
                    rule = %alert.rule_name,
                    severity = ?alert.severity,
                    "Alert firing"
                );
            }
        }
        Ok(())
    }
}

/// POSTs each transition as a JSON `Alert` to a configured endpoint.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        let response = self.client.post(&self.url).json(alert).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("webhook {} returned status {}", self.url, response.status());
        }
        Ok(())
    }
}
