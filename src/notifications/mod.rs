use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;

/// A message addressed to a single customer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    VehicleReady,
}

impl Notification {
    /// "Your vehicle is ready" message sent when a service order is finalized.
    pub fn vehicle_ready(
        recipient: impl Into<String>,
        recipient_name: impl Into<String>,
        order_id: i32,
        vehicle: &str,
    ) -> Self {
        let recipient_name = recipient_name.into();
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            subject: format!("Your vehicle is ready (order #{})", order_id),
            body: format!(
                "Hello {}, the work on your {} is finished and the vehicle is ready for pickup. Service order #{}.",
                recipient_name, vehicle, order_id
            ),
            recipient_name,
            notification_type: NotificationType::VehicleReady,
            created_at: Utc::now(),
        }
    }
}

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Delivery endpoint rejected notification with status {0}")]
    Rejected(u16),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Delivers customer notifications. Implementations must not assume the caller retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification (log only)"
        );
        Ok(())
    }
}

/// POSTs notifications as JSON to a mail relay or messaging gateway.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            from: from.into(),
        })
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    #[serde(flatten)]
    notification: &'a Notification,
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, notification), fields(recipient = %notification.recipient))]
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                from: &self.from,
                notification,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }
        info!("notification delivered");
        Ok(())
    }
}

/// Keeps sent notifications in memory; used by tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|e| NotificationError::Internal(e.to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

/// Picks the webhook notifier when a URL is configured, the log notifier otherwise.
pub fn notifier_from_config(config: &AppConfig) -> Result<Arc<dyn Notifier>, NotificationError> {
    match config.notification_webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(Arc::new(WebhookNotifier::new(
            url,
            config.notification_from_address.clone(),
        )?)),
        _ => Ok(Arc::new(LogNotifier)),
    }
}
