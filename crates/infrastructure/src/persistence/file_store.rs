//! File-backed key-value store.
//!
//! All keys live in one JSON object:
//! ```json
//! {
//!   "quoteconnect.session": "{\"schema_version\":1,...}",
//!   "quoteconnect.token": "{...}"
//! }
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quoteconnect_application::ports::{KeyValueStore, PersistenceError};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable};

type Entries = BTreeMap<String, String>;

/// Default storage file: `<data dir>/quoteconnect/storage.json`.
///
/// Falls back to the working directory when the platform has no data dir.
#[must_use]
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quoteconnect")
        .join("storage.json")
}

/// Key-value store persisted as a JSON file.
///
/// Every operation reads the file, so separate processes sharing the file
/// see each other's writes. Writes go to a sibling temp file that is then
/// renamed over the original. An unreadable file is treated as empty and
/// replaced on the next write.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at [`default_storage_path`].
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(default_storage_path())
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, PersistenceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Entries::new());
        }
        match from_json_bytes(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "storage file is unreadable; starting empty");
                Ok(Entries::new())
            }
        }
    }

    async fn persist(&self, entries: &Entries) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json =
            to_json_stable(entries).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), keys = entries.len(), "storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileKeyValueStore {
        FileKeyValueStore::new(dir.path().join("nested").join("storage.json"))
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get("quoteconnect.session").await.unwrap(), None);
        store.remove("quoteconnect.session").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        store_in(&dir).set("a", "1").await.unwrap();
        store_in(&dir).set("b", "2").await.unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("2"));

        reopened.remove("a").await.unwrap();
        assert_eq!(store_in(&dir).get("a").await.unwrap(), None);

        let raw = std::fs::read_to_string(reopened.path()).unwrap();
        assert_eq!(raw, "{\n  \"b\": \"2\"\n}\n");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced_on_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = default_storage_path();
        assert!(path.ends_with("quoteconnect/storage.json"));
    }
}
