//! Key-value persistence boundary.

mod database;
mod memory;
mod table;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use rolapet_common::AppResult;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;

pub use database::DatabaseStore;
pub use memory::MemoryStore;
pub use table::{Document, Record, Rows, Table};

/// Namespaced storage of JSON collections.
///
/// Keys passed in are logical collection names; implementations apply
/// their namespace prefix.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a collection, `None` if it was never written.
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;

    /// Overwrite a collection.
    async fn set(&self, key: &str, value: Value) -> AppResult<()>;

    /// Delete a collection.
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Delete every collection in this namespace.
    async fn clear(&self) -> AppResult<()>;
}

/// Handle to the key-value store plus one lock per collection.
///
/// Cloning is cheap; clones share both the backend and the locks, so
/// every [`Table`] for the same key serializes against the others.
#[derive(Clone)]
pub struct Store {
    kv: Arc<dyn KeyValueStore>,
    locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Store {
    /// Wrap a key-value backend.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            locks: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// In-memory store, mostly for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new("rolapet_")))
    }

    /// Typed table of records stored under `key`.
    #[must_use]
    pub fn table<T: Record>(&self, key: &str) -> Table<T> {
        Table::new(self.document(key))
    }

    /// Single JSON document stored under `key`.
    #[must_use]
    pub fn document<T>(&self, key: &str) -> Document<T>
    where
        T: Serialize + DeserializeOwned + Default + Send,
    {
        Document::new(Arc::clone(&self.kv), key, self.lock_for(key))
    }

    /// Delete every collection in the namespace.
    pub async fn clear(&self) -> AppResult<()> {
        self.kv.clear().await
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
