use quoteconnect_application::ports::NotificationSink;
use quoteconnect_domain::{Notification, NotificationLevel};
use tracing::{info, warn};

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            title,
            description,
            level,
        } = notification;
        match level {
            NotificationLevel::Error => warn!(target: "quoteconnect::notify", %title, %description),
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(target: "quoteconnect::notify", %title, %description);
            }
        }
    }
}
