//! Session ownership.
//!
//! The [`SessionStore`] is the only place the current `Session` lives. It is
//! written by the auth controller and the startup restore path, and read by
//! everyone else.

mod snapshot;
mod store;

pub use snapshot::{SCHEMA_VERSION, SESSION_KEY, SessionSnapshotStore, SnapshotError, decode, encode};
pub use store::SessionStore;
