//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod identity_provider;
mod key_value_store;
mod notification_sink;
mod subscription;

pub use clock::Clock;
pub use identity_provider::{IdentityProvider, ProviderSession, SessionChange};
pub use key_value_store::{KeyValueStore, PersistenceError};
pub use notification_sink::NotificationSink;
pub use subscription::{Listener, ListenerRegistry, Subscription};
