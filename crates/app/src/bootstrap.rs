//! Wiring of adapters into the application core.

use std::sync::Arc;

use quoteconnect_application::ports::{IdentityProvider, KeyValueStore};
use quoteconnect_application::{
    AuthController, AuthSettings, RouteGuard, SessionSnapshotStore, SessionStore,
};
use quoteconnect_domain::Notification;
use quoteconnect_infrastructure::{
    AppConfig, ChannelNotifier, ConfigError, FileKeyValueStore, LocalIdentityProvider,
    ProviderKind, RemoteIdentityProvider, SystemClock,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::AppError;

/// Everything a command needs.
pub struct Services {
    /// Auth flows over the configured provider.
    pub controller: Arc<AuthController>,
    /// Route access decisions.
    pub guard: RouteGuard,
    /// Notifications raised by the flows, in order.
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Services {
    /// Takes every notification raised so far.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }
}

/// Builds the service graph described by `config`.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete for the selected
/// provider or the remote client cannot be created.
pub fn bootstrap(config: &AppConfig) -> Result<Services, AppError> {
    config.validate()?;

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.storage_path));
    let snapshot = SessionSnapshotStore::new(Arc::clone(&storage));

    let provider: Arc<dyn IdentityProvider> = match config.provider {
        ProviderKind::Local => Arc::new(LocalIdentityProvider::new().with_snapshot(snapshot.clone())),
        ProviderKind::Remote => {
            let backend_url = config
                .backend_url
                .as_deref()
                .ok_or(ConfigError::Missing("QUOTECONNECT_BACKEND_URL"))?;
            let anon_key = config
                .anon_key
                .clone()
                .ok_or(ConfigError::Missing("QUOTECONNECT_ANON_KEY"))?;
            let mut remote = RemoteIdentityProvider::new(backend_url, anon_key, Arc::clone(&storage))?;
            if let Some(timeout) = config.request_timeout() {
                remote = remote.with_request_timeout(timeout)?;
            }
            Arc::new(remote)
        }
    };
    debug!(
        provider = provider.name(),
        storage = %config.storage_path.display(),
        "services configured"
    );

    let store = SessionStore::with_snapshot(Arc::new(SystemClock::new()), snapshot);
    let (notifier, notifications) = ChannelNotifier::channel();
    let controller = AuthController::new(provider, store, Arc::new(notifier)).with_settings(
        AuthSettings {
            request_timeout: config.request_timeout(),
        },
    );

    Ok(Services {
        controller: Arc::new(controller),
        guard: RouteGuard::default(),
        notifications,
    })
}
