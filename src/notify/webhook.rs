// src/notify/webhook.rs

//! Webhook delivery of the run report.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{Notifier, NotifyPayload};

/// Posts the run report as JSON to a configured endpoint.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, payload: &NotifyPayload) -> anyhow::Result<()> {
        let body = json!({
            "subject": payload.subject,
            "body": payload.body,
            "logs": payload
                .logs
                .iter()
                .map(|log| json!({ "name": log.name, "contents": log.contents }))
                .collect::<Vec<_>>(),
        });

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned {status}: {text}");
        }

        info!(url = %self.url, "sent webhook notification");
        Ok(())
    }
}
