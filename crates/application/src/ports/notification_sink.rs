//! Notification sink port

use quoteconnect_domain::Notification;

/// Receives toast-style notifications produced by auth flows.
///
/// Implementations must not block: flows call this inline.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: Notification);
}
