// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{StateError, StateStore};

/// Non-durable state store, for tests and ephemeral sessions.
pub struct MemoryStateStore {
    data: DashMap<String, String>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.data.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StateError> {
        self.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VISITED_KEY;

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStateStore::new();
        store.set("k", "1").await.unwrap();
        store.set("k", "2").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_flags() {
        let store = MemoryStateStore::default();
        assert!(!store.is_set(VISITED_KEY).await.unwrap());

        store.set_flag(VISITED_KEY).await.unwrap();
        assert!(store.is_set(VISITED_KEY).await.unwrap());

        store.remove(VISITED_KEY).await.unwrap();
        assert!(!store.is_set(VISITED_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let store = MemoryStateStore::new();
        assert!(store.remove("nope").await.is_ok());
    }
}
