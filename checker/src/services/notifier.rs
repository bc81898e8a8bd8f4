use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants::http::WEBHOOK_TIMEOUT;

/// Delivers status text to a node owner
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, owner_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub timestamp: DateTime<Utc>,
    pub owner_id: i64,
    pub text: String,
}

/// Posts notifications as JSON to a webhook; a blank URL disables delivery
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, owner_id: i64, text: &str) -> Result<()> {
        if self.webhook_url.is_empty() {
            debug!("No webhook URL configured, skipping notification for owner {}", owner_id);
            return Ok(());
        }

        let payload = NotificationPayload {
            timestamp: Utc::now(),
            owner_id,
            text: text.to_string(),
        };

        match timeout(
            WEBHOOK_TIMEOUT,
            self.client.post(&self.webhook_url).json(&payload).send(),
        )
        .await
        {
            Ok(Ok(response)) if response.status().is_success() => {
                info!("Notification delivered to owner {}", owner_id);
                Ok(())
            }
            Ok(Ok(response)) => {
                warn!("Notification webhook returned status {} for owner {}", response.status(), owner_id);
                Err(anyhow!("Webhook returned status {}", response.status()))
            }
            Ok(Err(e)) => {
                warn!("Failed to notify owner {}: {}", owner_id, e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Notification webhook timeout for owner {}", owner_id);
                Err(anyhow!("Webhook timed out after {} seconds", WEBHOOK_TIMEOUT.as_secs()))
            }
        }
    }
}
