//! statestore - Durable key-value session-state storage
//!
//! A storage abstraction for per-key state blobs (e.g., conversational
//! session state) backed by a document database, with optimistic concurrency
//! control:
//!
//! - **[`StateStorage`]** - the read/write/delete trait implemented by every backend
//! - **[`DocumentDbStateStore`]** - durable backend on MongoDB/DocumentDB with
//!   lazy one-time collection provisioning
//! - **[`MemoryStateStore`]** - in-process backend with identical semantics,
//!   for tests and local development
//! - **[`sanitize_key`]** - deterministic rewriting of arbitrary keys into
//!   storage-legal document ids
//!
//! Every stored value carries a revision token assigned by the store. A write
//! may present the token from a prior read to make the replace conditional:
//! if another writer got there first, the call fails with
//! [`StoreError::ConcurrencyConflict`] instead of silently clobbering.
//!
//! # Example
//!
//! ```rust,no_run
//! use statestore::{DocumentDbConfig, DocumentDbStateStore, StateStorage, StoreItem, StoreItems};
//! use serde_json::json;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let store = DocumentDbStateStore::new(DocumentDbConfig::new(
//!         "mongodb://localhost:27017",
//!         "session_state",
//!         "state_items",
//!     ))
//!     .await?;
//!
//!     // Unconditional write
//!     let mut changes = StoreItems::new();
//!     changes.insert("user/1".to_string(), StoreItem::new(json!({"turn": 1})));
//!     store.write(&changes).await?;
//!
//!     // Read returns items keyed by the original key, tokens attached
//!     let items = store.read(&["user/1".to_string()]).await?;
//!     let current = &items["user/1"];
//!
//!     // Conditional write: fails if someone else wrote in between
//!     let mut changes = StoreItems::new();
//!     changes.insert(
//!         "user/1".to_string(),
//!         StoreItem {
//!             value: json!({"turn": 2}),
//!             concurrency_token: current.concurrency_token.clone(),
//!         },
//!     );
//!     store.write(&changes).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod envelope;
mod provision;

/// DocumentDB/MongoDB backend
pub mod documentdb;
/// Error types
pub mod error;
/// Store item data model
pub mod item;
/// In-memory backend
pub mod memory;
/// Key sanitization
pub mod sanitize;
/// Storage traits
pub mod traits;

pub use documentdb::{DocumentDbConfig, DocumentDbStateStore};
pub use error::{StoreError, StoreResult};
pub use item::{StoreItem, StoreItems};
pub use memory::MemoryStateStore;
pub use sanitize::sanitize_key;
pub use traits::{StateStorage, StateStorageExt};
