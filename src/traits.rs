//! State Storage Traits
//!
//! Defines the core trait for durable key-value state stores.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::item::{StoreItem, StoreItems};

/// Core trait for durable key-value state storage with optimistic concurrency.
///
/// Implementations persist opaque JSON values keyed by arbitrary strings.
/// Values read back carry a revision token; writes may be conditioned on a
/// previously read token and fail with
/// [`StoreError::ConcurrencyConflict`](crate::StoreError::ConcurrencyConflict)
/// when the stored revision has moved on.
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Read the items for the given keys.
    ///
    /// Returns a mapping keyed by the original application keys; keys with no
    /// stored record are simply absent. Fails with
    /// [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument) if `keys` is empty.
    async fn read(&self, keys: &[String]) -> StoreResult<StoreItems>;

    /// Write the given changes, entry by entry.
    ///
    /// Entries are applied sequentially; the first failure aborts the call and
    /// entries already applied remain persisted. An entry's concurrency token
    /// selects the write mode: absent or `"*"` upserts unconditionally, a
    /// non-empty token makes the replace conditional, and an empty string
    /// fails with [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument). An empty change-set is a
    /// no-op.
    async fn write(&self, changes: &StoreItems) -> StoreResult<()>;

    /// Delete the given keys.
    ///
    /// Deleting a key with no stored record is success, not an error. An
    /// empty key set is a no-op.
    async fn delete(&self, keys: &[String]) -> StoreResult<()>;
}

/// Extension trait with single-key conveniences
///
/// Blanket-implemented for every [`StateStorage`].
#[async_trait]
pub trait StateStorageExt: StateStorage {
    /// Read a single key, returning `None` if no record exists
    async fn read_one(&self, key: &str) -> StoreResult<Option<StoreItem>> {
        let mut items = self.read(std::slice::from_ref(&key.to_string())).await?;
        Ok(items.remove(key))
    }

    /// Write a single key/item pair
    async fn write_one(&self, key: &str, item: StoreItem) -> StoreResult<()> {
        let mut changes = StoreItems::new();
        changes.insert(key.to_string(), item);
        self.write(&changes).await
    }
}

impl<T: StateStorage + ?Sized> StateStorageExt for T {}
