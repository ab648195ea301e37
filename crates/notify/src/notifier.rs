//! Notification emitter.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use internhub_core::Notification;
use internhub_storage::Storage;
use reqwest::Client;

/// Emits notifications. Fire-and-forget: implementations must not fail.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Record and deliver a notification.
    async fn notify(&self, notification: Notification);
}

/// Where a stored notification is pushed after it is recorded.
#[derive(Debug, Clone, Default)]
pub enum DeliveryChannel {
    /// Store only; clients poll their inbox
    #[default]
    None,

    /// Log each notification
    Log,

    /// POST each notification as JSON
    Webhook {
        /// Endpoint URL
        url: String,
    },
}

/// Notifier configuration.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Delivery channel
    pub channel: DeliveryChannel,

    /// Request timeout for webhook delivery
    pub webhook_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel: DeliveryChannel::None,
            webhook_timeout: Duration::from_secs(5),
        }
    }
}

impl NotifyConfig {
    /// Set the delivery channel.
    pub fn with_channel(mut self, channel: DeliveryChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the webhook timeout.
    pub fn with_webhook_timeout(mut self, timeout: Duration) -> Self {
        self.webhook_timeout = timeout;
        self
    }
}

/// Notifier that appends records to storage, then dispatches them.
pub struct StoreNotifier<S: Storage> {
    storage: Arc<S>,
    channel: DeliveryChannel,
    client: Client,
}

impl<S: Storage> StoreNotifier<S> {
    /// Create a notifier over `storage`.
    pub fn new(storage: Arc<S>, config: NotifyConfig) -> Self {
        let client = Client::builder()
            .timeout(config.webhook_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            storage,
            channel: config.channel,
            client,
        }
    }

    async fn dispatch(&self, notification: &Notification) -> Result<(), String> {
        match &self.channel {
            DeliveryChannel::None => Ok(()),
            DeliveryChannel::Log => {
                tracing::info!(
                    recipient = %notification.recipient,
                    kind = ?notification.kind,
                    "{}: {}",
                    notification.title,
                    notification.message
                );
                Ok(())
            }
            DeliveryChannel::Webhook { url } => {
                self.client
                    .post(url)
                    .json(notification)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map(|_| ())
                    .map_err(|e| format!("webhook {} failed: {}", url, e))
            }
        }
    }
}

#[async_trait]
impl<S: Storage + 'static> Notifier for StoreNotifier<S> {
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.storage.save_notification(&notification).await {
            tracing::warn!(
                "Failed to record notification {} for {}: {}",
                notification.id,
                notification.recipient,
                e
            );
            return;
        }

        if let Err(e) = self.dispatch(&notification).await {
            tracing::warn!("Failed to deliver notification {}: {}", notification.id, e);
        }
    }
}
