//! In-Memory State Store
//!
//! In-process reference implementation of [`StateStorage`], useful for tests
//! and local development. Token semantics match the DocumentDB backend
//! exactly: every write assigns a fresh revision token, and conditional
//! writes compare against the stored one.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::item::{StoreItem, StoreItems};
use crate::traits::StateStorage;

struct MemoryEntry {
    value: serde_json::Value,
    concurrency_token: String,
}

/// In-memory state store keyed by the original application key
#[derive(Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStorage for MemoryStateStore {
    async fn read(&self, keys: &[String]) -> StoreResult<StoreItems> {
        if keys.is_empty() {
            return Err(StoreError::InvalidArgument(
                "read requires at least one key".to_string(),
            ));
        }

        let entries = self.entries.lock().await;
        let mut items = StoreItems::new();
        for key in keys {
            if let Some(entry) = entries.get(key) {
                items.insert(
                    key.clone(),
                    StoreItem::with_token(entry.value.clone(), entry.concurrency_token.clone()),
                );
            }
        }
        Ok(items)
    }

    async fn write(&self, changes: &StoreItems) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        for (key, item) in changes {
            let fresh = MemoryEntry {
                value: item.stripped_value(),
                concurrency_token: uuid::Uuid::new_v4().to_string(),
            };
            match item.concurrency_token.as_deref() {
                None | Some("*") => {
                    entries.insert(key.clone(), fresh);
                }
                Some("") => {
                    return Err(StoreError::InvalidArgument(format!(
                        "empty concurrency token for key '{}'",
                        key
                    )));
                }
                Some(token) => {
                    match entries.get(key) {
                        None => return Err(StoreError::NotFound(key.clone())),
                        Some(existing) if existing.concurrency_token != token => {
                            return Err(StoreError::ConcurrencyConflict {
                                key: key.clone(),
                                token: token.to_string(),
                            });
                        }
                        Some(_) => {}
                    }
                    entries.insert(key.clone(), fresh);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
