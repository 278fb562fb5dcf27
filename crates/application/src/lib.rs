//! QuoteConnect Application - Ports, session store, auth flows and route guard
//!
//! This crate defines the application layer with:
//! - Port traits (identity provider, key-value persistence, notifications, clock)
//! - The session store, the single owner of the current `Session`
//! - The auth controller orchestrating login, signup and logout
//! - The route guard deciding view access from a session

pub mod auth;
pub mod guard;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{AuthController, AuthSettings, ProviderWatch, SignupOutcome};
pub use guard::{RouteGuard, RouteRule, RouteTable, decide};
pub use ports::{
    Clock, IdentityProvider, KeyValueStore, Listener, ListenerRegistry, NotificationSink,
    PersistenceError, ProviderSession, SessionChange, Subscription,
};
pub use session::{SessionSnapshotStore, SessionStore};
