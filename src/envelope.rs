//! Persisted document envelope
//!
//! The envelope is the record shape written to the backing collection. It is
//! crate-internal and transient: callers only ever see `StoreItem`s. The
//! sanitized id serves as the document primary key while the original key is
//! preserved verbatim for lossless recovery.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::item::StoreItem;
use crate::sanitize::sanitize_key;

/// Persisted record pairing a caller value with key and revision metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DocumentEnvelope {
    /// Storage-legal primary key derived from the original key
    #[serde(rename = "_id")]
    pub sanitized_id: String,

    /// Unsanitized application key, preserved verbatim
    pub original_key: String,

    /// Serialized payload with any embedded token field stripped
    pub payload: serde_json::Value,

    /// Revision stamp assigned on every write
    pub concurrency_token: String,

    /// Unix timestamp of the write; not projected back on reads
    #[serde(default)]
    pub modified_at: i64,
}

impl DocumentEnvelope {
    /// Build an envelope for writing, assigning a fresh revision token
    pub fn from_item(key: &str, item: &StoreItem) -> Self {
        Self {
            sanitized_id: sanitize_key(key),
            original_key: key.to_string(),
            payload: item.stripped_value(),
            concurrency_token: uuid::Uuid::new_v4().to_string(),
            modified_at: Utc::now().timestamp(),
        }
    }

    /// Unpack a read envelope into the original key and an item carrying the
    /// store's revision token
    pub fn into_item(self) -> (String, StoreItem) {
        (
            self.original_key,
            StoreItem::with_token(self.payload, self.concurrency_token),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_item_sanitizes_id_and_keeps_original() {
        let item = StoreItem::new(json!({"turn": 3}));
        let envelope = DocumentEnvelope::from_item("user/1 state", &item);
        assert_eq!(envelope.sanitized_id, "user*2f1*20state");
        assert_eq!(envelope.original_key, "user/1 state");
        assert_eq!(envelope.payload, json!({"turn": 3}));
        assert!(!envelope.concurrency_token.is_empty());
    }

    #[test]
    fn test_from_item_strips_embedded_token() {
        let item = StoreItem::new(json!({"turn": 3, "concurrency_token": "old"}));
        let envelope = DocumentEnvelope::from_item("k", &item);
        assert_eq!(envelope.payload, json!({"turn": 3}));
    }

    #[test]
    fn test_fresh_token_per_write() {
        let item = StoreItem::new(json!({}));
        let a = DocumentEnvelope::from_item("k", &item);
        let b = DocumentEnvelope::from_item("k", &item);
        assert_ne!(a.concurrency_token, b.concurrency_token);
    }

    #[test]
    fn test_into_item_attaches_token_and_original_key() {
        let envelope = DocumentEnvelope {
            sanitized_id: "a*2fb".to_string(),
            original_key: "a/b".to_string(),
            payload: json!({"x": 1}),
            concurrency_token: "rev-1".to_string(),
            modified_at: 0,
        };
        let (key, item) = envelope.into_item();
        assert_eq!(key, "a/b");
        assert_eq!(item.value, json!({"x": 1}));
        assert_eq!(item.concurrency_token.as_deref(), Some("rev-1"));
    }
}
