//! Authentication flows.
//!
//! The [`AuthController`] runs login, signup and logout against an
//! [`IdentityProvider`](crate::ports::IdentityProvider), writes the outcome
//! to the [`SessionStore`](crate::session::SessionStore) and reports it to a
//! [`NotificationSink`](crate::ports::NotificationSink).

mod controller;
mod watch;

pub use controller::{AuthController, AuthSettings, SignupOutcome};
pub use watch::ProviderWatch;
