use quoteconnect_application::ports::NotificationSink;
use quoteconnect_domain::Notification;
use tokio::sync::mpsc;
use tracing::debug;

/// Forwards notifications to a presentation loop over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver the presentation layer drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            debug!(title = %e.0.title, "notification dropped: receiver closed");
        }
    }
}
