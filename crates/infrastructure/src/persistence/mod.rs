//! Key-value store adapters.

mod file_store;
mod memory_store;

pub use file_store::{FileKeyValueStore, default_storage_path};
pub use memory_store::InMemoryKeyValueStore;
