//! Forwarding of provider-driven session changes into the session store.

use tokio::task::JoinHandle;

use crate::ports::Subscription;

/// Keeps a provider subscription and its forwarding task alive.
///
/// Dropping it disposes the subscription and stops the task.
#[derive(Debug)]
#[must_use = "dropping a ProviderWatch stops listening for provider session changes"]
pub struct ProviderWatch {
    subscription: Option<Subscription>,
    task: JoinHandle<()>,
}

impl ProviderWatch {
    pub(crate) const fn new(subscription: Subscription, task: JoinHandle<()>) -> Self {
        Self {
            subscription: Some(subscription),
            task,
        }
    }

    /// Stops listening.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ProviderWatch {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
        }
        self.task.abort();
    }
}
