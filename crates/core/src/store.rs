// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory key-value state rebuilt from the transaction log

use crate::event::{Event, EventType};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

/// Errors returned by store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no such key: {0}")]
    NoSuchKey(String),
}

/// Contract the recovery driver and the HTTP layer rely on
pub trait KeyValueStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<String, StoreError>;

    /// Deleting a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Apply a logged event to the store
    fn apply(&self, event: &Event) -> Result<(), StoreError> {
        match event.event_type {
            EventType::Put => self.put(&event.key, &event.value),
            EventType::Delete => self.delete(&event.key),
        }
    }
}

/// Thread-safe `HashMap` store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents, sorted by key
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut pairs: Vec<_> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<String, StoreError> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
