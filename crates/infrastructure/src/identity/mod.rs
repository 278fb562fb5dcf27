//! Identity provider adapters.
//!
//! [`LocalIdentityProvider`] serves a fixed directory of demo accounts and
//! keeps its session in the local snapshot. [`RemoteIdentityProvider`]
//! talks to a hosted auth + profiles backend over REST.

mod local;
mod remote;
mod wire;

pub use local::{DEMO_PASSWORD, LocalIdentityProvider};
pub use remote::{RemoteIdentityProvider, RemoteProviderError, TOKEN_KEY};
