//! DocumentDB/MongoDB State Store
//!
//! Durable [`StateStorage`] implementation backed by MongoDB/DocumentDB.
//! Documents live in a single collection provisioned lazily on first use;
//! conditional writes are expressed as filtered replaces on the stored
//! revision token.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use statestore::{DocumentDbConfig, DocumentDbStateStore, StateStorageExt, StoreItem};
//! use serde_json::json;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = DocumentDbConfig::new(
//!         "mongodb://localhost:27017",
//!         "session_state",
//!         "state_items",
//!     );
//!     let store = DocumentDbStateStore::new(config).await?;
//!
//!     store.write_one("user/1", StoreItem::new(json!({"turn": 1}))).await?;
//!     let item = store.read_one("user/1").await?;
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{ClientOptions, FindOptions},
    Client, Collection,
};
use tracing::debug;

use crate::envelope::DocumentEnvelope;
use crate::error::{StoreError, StoreResult};
use crate::item::{StoreItem, StoreItems};
use crate::provision::LazyCollectionProvisioner;
use crate::sanitize::sanitize_key;
use crate::traits::StateStorage;

/// Server error code for "collection already exists"
const NAMESPACE_EXISTS: i32 = 48;

/// Configuration for [`DocumentDbStateStore`]
///
/// The connection string carries the endpoint address and credential. The
/// optional client-options hook customizes connection policy (timeouts, pool
/// sizing, server selection) before the client is built.
pub struct DocumentDbConfig {
    connection_string: String,
    database: String,
    collection: String,
    client_options_hook: Option<Box<dyn FnOnce(&mut ClientOptions) + Send>>,
}

impl DocumentDbConfig {
    /// Create a configuration from connection string, database and collection
    pub fn new(
        connection_string: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            database: database.into(),
            collection: collection.into(),
            client_options_hook: None,
        }
    }

    /// Customize the parsed client options before the client is built
    pub fn with_client_options<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut ClientOptions) + Send + 'static,
    {
        self.client_options_hook = Some(Box::new(hook));
        self
    }

    fn validate(&self) -> StoreResult<()> {
        if self.connection_string.is_empty() {
            return Err(StoreError::InvalidArgument(
                "connection_string is required".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(StoreError::InvalidArgument("database is required".to_string()));
        }
        if self.collection.is_empty() {
            return Err(StoreError::InvalidArgument(
                "collection is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// DocumentDB/MongoDB state store
pub struct DocumentDbStateStore {
    client: Client,
    database_name: String,
    collection_name: String,
    provisioner: LazyCollectionProvisioner<Collection<DocumentEnvelope>>,
}

impl DocumentDbStateStore {
    /// Create a new store from configuration.
    ///
    /// Validates required parameters and builds the client; no network
    /// round-trip happens here. The collection is provisioned lazily by the
    /// first operation.
    pub async fn new(config: DocumentDbConfig) -> StoreResult<Self> {
        config.validate()?;

        let mut client_options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if let Some(hook) = config.client_options_hook {
            hook(&mut client_options);
        }

        let client = Client::with_options(client_options)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            database_name: config.database,
            collection_name: config.collection,
            provisioner: LazyCollectionProvisioner::new(),
        })
    }

    /// Check whether the backing store answers a ping
    pub async fn is_available(&self) -> bool {
        self.client
            .database(&self.database_name)
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    /// One-time creation of the backing collection.
    ///
    /// The database itself springs into existence with its first collection,
    /// so only the collection needs an explicit create. A concurrent creator
    /// racing us is fine: "namespace exists" counts as success.
    async fn provision(&self) -> StoreResult<Collection<DocumentEnvelope>> {
        let db = self.client.database(&self.database_name);
        match db.create_collection(&self.collection_name).await {
            Ok(()) => {}
            Err(e) if is_namespace_exists(&e) => {}
            Err(e) => return Err(StoreError::Provisioning(e.to_string())),
        }
        debug!(
            database = %self.database_name,
            collection = %self.collection_name,
            "provisioned state collection"
        );
        Ok(db.collection(&self.collection_name))
    }

    /// Memoized collection handle, provisioning on first use
    async fn collection(&self) -> StoreResult<&Collection<DocumentEnvelope>> {
        self.provisioner.ensure_ready(|| self.provision()).await
    }

    /// Apply one write entry; called sequentially per entry
    async fn write_entry(
        &self,
        collection: &Collection<DocumentEnvelope>,
        key: &str,
        item: &StoreItem,
    ) -> StoreResult<()> {
        let envelope = DocumentEnvelope::from_item(key, item);
        let id = envelope.sanitized_id.clone();

        match item.concurrency_token.as_deref() {
            // Unconditional insert-or-replace
            None | Some("*") => {
                collection
                    .replace_one(doc! { "_id": &id }, envelope)
                    .upsert(true)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(())
            }
            // An empty token is never a value a prior read produced
            Some("") => Err(StoreError::InvalidArgument(format!(
                "empty concurrency token for key '{}'",
                key
            ))),
            // Replace only if the stored revision still matches
            Some(token) => {
                let result = collection
                    .replace_one(doc! { "_id": &id, "concurrency_token": token }, envelope)
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                if result.matched_count == 0 {
                    let exists = collection
                        .count_documents(doc! { "_id": &id })
                        .await
                        .map_err(|e| StoreError::Backend(e.to_string()))?
                        > 0;
                    if exists {
                        return Err(StoreError::ConcurrencyConflict {
                            key: key.to_string(),
                            token: token.to_string(),
                        });
                    }
                    return Err(StoreError::NotFound(key.to_string()));
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl StateStorage for DocumentDbStateStore {
    async fn read(&self, keys: &[String]) -> StoreResult<StoreItems> {
        if keys.is_empty() {
            return Err(StoreError::InvalidArgument(
                "read requires at least one key".to_string(),
            ));
        }

        let collection = self.collection().await?;
        let ids: Vec<String> = keys.iter().map(|k| sanitize_key(k)).collect();

        // Each id is bound as a BSON value, never concatenated into the query
        let filter = doc! { "_id": { "$in": ids } };
        let options = FindOptions::builder()
            .projection(doc! {
                "_id": 1,
                "original_key": 1,
                "payload": 1,
                "concurrency_token": 1,
            })
            .build();

        let mut cursor = collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Drain every batch; the server may paginate large results
        let mut items = StoreItems::new();
        while let Some(envelope) = cursor
            .try_next()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            let (key, item) = envelope.into_item();
            items.insert(key, item);
        }
        Ok(items)
    }

    async fn write(&self, changes: &StoreItems) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let collection = self.collection().await?;

        // Sequential by design: the first failing entry aborts the call and
        // entries already applied stay persisted.
        for (key, item) in changes {
            self.write_entry(collection, key, item).await?;
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let collection = self.collection().await?;

        // Deletes are independent and idempotent, so fan out concurrently and
        // join on the whole batch before reporting the first failure.
        let deletes = keys.iter().map(|key| {
            let filter = doc! { "_id": sanitize_key(key) };
            async move { collection.delete_one(filter).await }
        });
        for result in join_all(deletes).await {
            result.map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

fn is_namespace_exists(error: &mongodb::error::Error) -> bool {
    matches!(*error.kind, mongodb::error::ErrorKind::Command(ref c) if c.code == NAMESPACE_EXISTS)
}
