//! Store item data model
//!
//! `StoreItem` is the caller-owned unit of persistence: an opaque JSON value
//! plus an optional concurrency token. The token is revision metadata carried
//! out-of-band by the store, never part of the persisted payload body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StoreResult;

/// Serde field name under which a token would appear if a caller embedded
/// one inside the value; stripped before persistence.
pub(crate) const TOKEN_FIELD: &str = "concurrency_token";

/// A caller-owned value persisted by a state store.
///
/// Items returned by a read carry the store's revision token at the moment of
/// the read; presenting that token on a later write makes the write
/// conditional on no intervening change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    /// Application payload
    pub value: serde_json::Value,

    /// Revision token assigned by the store.
    ///
    /// `None` or `"*"` on write means unconditional upsert; any other
    /// non-empty value makes the write conditional on that revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_token: Option<String>,
}

impl StoreItem {
    /// Create an item with no concurrency token (unconditional on write)
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            concurrency_token: None,
        }
    }

    /// Create an item carrying a concurrency token
    pub fn with_token(value: serde_json::Value, token: impl Into<String>) -> Self {
        Self {
            value,
            concurrency_token: Some(token.into()),
        }
    }

    /// Serialize any value into a tokenless item
    pub fn from_serialize<T: Serialize>(value: &T) -> StoreResult<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Deserialize the payload into a typed value
    pub fn to_typed<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    /// Payload body for persistence: the value with any embedded
    /// concurrency-token field removed. The token travels as envelope
    /// metadata, never inside the serialized body.
    pub(crate) fn stripped_value(&self) -> serde_json::Value {
        let mut value = self.value.clone();
        if let serde_json::Value::Object(map) = &mut value {
            map.remove(TOKEN_FIELD);
        }
        value
    }
}

/// Mapping from application key to store item
pub type StoreItems = HashMap<String, StoreItem>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_item_has_no_token() {
        let item = StoreItem::new(json!({"count": 1}));
        assert!(item.concurrency_token.is_none());
    }

    #[test]
    fn test_stripped_value_removes_embedded_token() {
        let item = StoreItem::new(json!({
            "count": 1,
            "concurrency_token": "stale-copy"
        }));
        assert_eq!(item.stripped_value(), json!({"count": 1}));
        // The original item is untouched
        assert!(item.value.get(TOKEN_FIELD).is_some());
    }

    #[test]
    fn test_typed_round_trip() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct SessionState {
            turn: u32,
            topic: String,
        }

        let state = SessionState {
            turn: 7,
            topic: "weather".to_string(),
        };
        let item = StoreItem::from_serialize(&state).unwrap();
        let back: SessionState = item.to_typed().unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_stripped_value_passes_non_objects_through() {
        let item = StoreItem::new(json!([1, 2, 3]));
        assert_eq!(item.stripped_value(), json!([1, 2, 3]));

        let item = StoreItem::new(json!("scalar"));
        assert_eq!(item.stripped_value(), json!("scalar"));
    }
}
