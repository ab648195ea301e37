//! Recipient inbox: listing and read markers.

use std::sync::Arc;
use internhub_core::{Notification, NotificationId, RecipientKind};
use internhub_storage::{Result, Storage, StorageError};

/// Most notifications returned by one inbox listing.
pub const INBOX_LIMIT: usize = 20;

/// Read side of the notification store.
pub struct Inbox<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Inbox<S> {
    /// Create an inbox over `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Latest notifications for a recipient, newest first.
    pub async fn list(&self, recipient: &str, kind: RecipientKind) -> Result<Vec<Notification>> {
        self.storage
            .list_notifications(recipient, kind, INBOX_LIMIT)
            .await
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: NotificationId) -> Result<Notification> {
        let mut notification = self
            .storage
            .load_notification(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("notification {}", id)))?;

        if !notification.read {
            notification.read = true;
            self.storage.save_notification(&notification).await?;
        }
        Ok(notification)
    }
}
