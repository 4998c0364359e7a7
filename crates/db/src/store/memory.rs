//! In-process key-value backend.

use std::collections::HashMap;

use async_trait::async_trait;
use rolapet_common::AppResult;
use serde_json::Value;
use tokio::sync::RwLock;

use super::KeyValueStore;

/// Key-value store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespace: String,
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store whose keys are prefixed with `namespace`.
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    /// Insert a raw entry outside the namespace, as another application sharing the backend would.
    pub async fn insert_raw(&self, full_key: &str, value: Value) {
        self.entries.write().await.insert(full_key.to_string(), value);
    }

    /// Number of entries across all namespaces.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.entries.read().await.get(&self.full_key(key)).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        self.entries.write().await.insert(self.full_key(key), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(&self.full_key(key));
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let namespace = &self.namespace;
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(namespace.as_str()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_set_remove() {
        let store = MemoryStore::new("rolapet_");

        assert!(store.get("users").await.unwrap().is_none());
        store.set("users", json!([{"id": "1"}])).await.unwrap();
        assert_eq!(store.get("users").await.unwrap(), Some(json!([{"id": "1"}])));

        store.remove("users").await.unwrap();
        assert!(store.get("users").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_only_touches_namespace() {
        let store = MemoryStore::new("rolapet_");
        store.set("users", json!([])).await.unwrap();
        store.set("posts", json!([])).await.unwrap();
        store.insert_raw("other_app_key", json!(1)).await;

        store.clear().await.unwrap();

        assert!(store.get("users").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }
}
