//! QuoteConnect Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod config;
pub mod identity;
pub mod notify;
pub mod persistence;
pub mod serialization;

pub use adapters::SystemClock;
pub use config::{AppConfig, ConfigError, ProviderKind};
pub use identity::{LocalIdentityProvider, RemoteIdentityProvider, RemoteProviderError, TOKEN_KEY};
pub use notify::{ChannelNotifier, TracingNotifier};
pub use persistence::{FileKeyValueStore, InMemoryKeyValueStore, default_storage_path};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable};
