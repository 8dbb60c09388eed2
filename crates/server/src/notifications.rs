//! Outgoing push notifications.

use std::fmt;

use async_trait::async_trait;

/// Where monthly updates go and whether they are really delivered.
#[derive(Clone, Debug)]
pub struct NotificationSettings {
    pub collection: String,
    pub dry_run: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            collection: "devices".to_string(),
            dry_run: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Collection holding the target device tokens.
    pub collection: String,
    pub dry_run: bool,
}

/// A device that could not be reached.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryError {
    pub device: String,
    pub reason: String,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device, self.reason)
    }
}

/// Sends a notification to every device of a collection.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns one error per failed device; empty when all deliveries
    /// succeeded.
    async fn send(&self, notification: &Notification) -> Vec<DeliveryError>;
}

/// Writes notifications to the log instead of pushing them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Vec<DeliveryError> {
        tracing::info!(
            title = %notification.title,
            collection = %notification.collection,
            dry_run = notification.dry_run,
            "{}",
            notification.message
        );
        Vec::new()
    }
}
