//! Notification emitter and inbox.
//!
//! Lifecycle transitions produce notifications as a side effect. Delivery is
//! best-effort: failures are logged and never reach the caller of the
//! lifecycle operation.

#![warn(missing_docs)]

pub mod notifier;
pub mod inbox;

pub use notifier::{DeliveryChannel, Notifier, NotifyConfig, StoreNotifier};
pub use inbox::{Inbox, INBOX_LIMIT};
