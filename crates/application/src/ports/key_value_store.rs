//! Key-value persistence port
//!
//! The local-storage equivalent: a flat map of string keys to string values.

use async_trait::async_trait;

/// Errors that can occur during key-value operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be parsed or written.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Persistent string-to-string store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    /// `None` if nothing is stored under the key.
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be persisted.
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns an error if the store cannot be updated.
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}
