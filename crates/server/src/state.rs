//! Shared application state.

use std::sync::Arc;
use internhub_lifecycle::ReportLifecycleManager;
use internhub_notify::{Inbox, StoreNotifier};
use internhub_scheduler::DailyScheduler;
use internhub_storage::{JsonStorage, StorageError};

use crate::config::AppConfig;

/// Lifecycle manager over the JSON store.
pub type Manager = ReportLifecycleManager<JsonStorage, StoreNotifier<JsonStorage>>;

/// Daily scheduler over the JSON store.
pub type Scheduler = DailyScheduler<JsonStorage, StoreNotifier<JsonStorage>>;

/// State handed to every request handler.
pub struct AppState {
    /// Report lifecycle operations
    pub manager: Manager,
    /// Notification inbox
    pub inbox: Inbox<JsonStorage>,
}

impl AppState {
    /// Open the store and build the lifecycle manager and inbox.
    pub async fn open(config: &AppConfig) -> Result<Arc<Self>, StorageError> {
        let storage = Arc::new(JsonStorage::new(&config.data_dir).await?);
        let notifier = Arc::new(StoreNotifier::new(storage.clone(), config.notify.clone()));
        let manager = ReportLifecycleManager::new(storage.clone(), notifier)
            .with_config(config.lifecycle.clone());

        Ok(Arc::new(Self {
            manager,
            inbox: Inbox::new(storage),
        }))
    }

    /// Scheduler sharing this state's store and notifier.
    pub fn scheduler(&self, config: &AppConfig) -> Scheduler {
        DailyScheduler::new(self.manager.clone()).with_config(config.scheduler.clone())
    }
}
