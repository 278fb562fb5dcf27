//! Persisted session snapshot.
//!
//! The signed-in identity is written under a single key as a versioned
//! envelope:
//! ```json
//! { "schema_version": 1, "identity": { "id": "1", "email": "...", "role": "customer" } }
//! ```
//! Anything that does not decode is discarded on read.

use std::sync::Arc;

use quoteconnect_domain::Identity;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ports::{KeyValueStore, PersistenceError};

/// Storage key of the session snapshot.
pub const SESSION_KEY: &str = "quoteconnect.session";

/// Current envelope version.
pub const SCHEMA_VERSION: u32 = 1;

/// Why a stored snapshot was rejected.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Not valid JSON, or not the expected shape.
    #[error("malformed session snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Written by a newer or unknown schema.
    #[error("unsupported session snapshot version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema_version: u32,
    identity: &'a Identity,
}

#[derive(Deserialize)]
struct Envelope {
    schema_version: u32,
    identity: Identity,
}

/// Serializes `identity` into a snapshot envelope.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(identity: &Identity) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        schema_version: SCHEMA_VERSION,
        identity,
    })
}

/// Parses a snapshot envelope.
///
/// # Errors
/// Returns an error for malformed JSON or an unknown schema version.
pub fn decode(raw: &str) -> Result<Identity, SnapshotError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.schema_version != SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedVersion(envelope.schema_version));
    }
    Ok(envelope.identity)
}

/// Reads and writes the session snapshot in a key-value store.
#[derive(Clone)]
pub struct SessionSnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionSnapshotStore {
    /// Creates a snapshot store using the default key.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: SESSION_KEY.to_string(),
        }
    }

    /// Uses `key` instead of the default.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Loads the stored identity.
    ///
    /// A corrupt snapshot is removed and reported as `None`; read failures
    /// are also reported as `None`. Neither is raised to the caller.
    pub async fn load(&self) -> Option<Identity> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read session snapshot");
                return None;
            }
        };
        match decode(&raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable session snapshot");
                if let Err(e) = self.store.remove(&self.key).await {
                    warn!(key = %self.key, error = %e, "failed to remove session snapshot");
                }
                None
            }
        }
    }

    /// Writes `identity`, or removes the snapshot when `None`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be updated.
    pub async fn save(&self, identity: Option<&Identity>) -> Result<(), PersistenceError> {
        match identity {
            Some(identity) => {
                let raw =
                    encode(identity).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
                debug!(key = %self.key, "writing session snapshot");
                self.store.set(&self.key, &raw).await
            }
            None => {
                debug!(key = %self.key, "removing session snapshot");
                self.store.remove(&self.key).await
            }
        }
    }
}

impl std::fmt::Debug for SessionSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshotStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
