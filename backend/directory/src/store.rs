//! # Document Store
//!
//! The directory never talks to a concrete database. Everything goes through
//! [`DocumentStore`], a tiny surface over collections of untyped field bags:
//!
//! - list all documents of a collection
//! - get one document by id
//! - create a document under a caller-chosen id
//! - update in place (only the given fields are overwritten)
//! - delete by id
//!
//! No transactions, no retries. Consistency is whatever the backing store gives
//! us for a single read.
use std::{collections::BTreeMap, sync::RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const USERS: &str = "users";
pub const EVENTS: &str = "events";
pub const FUNDRAISING: &str = "fundraising";
pub const INTERNSHIPS: &str = "internships";
pub const NOTIFICATIONS: &str = "notifications";
pub const MENTORSHIP: &str = "mentorship";

pub type Fields = Map<String, Value>;

/// A stored document: its store-assigned key plus whatever fields it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Writes `fields` under `id`, replacing anything already stored there.
    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Process-local store, ordered by id within a collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Fields>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a collection, mostly for tests.
    pub fn with_documents(self, collection: &str, documents: Vec<Document>) -> Self {
        {
            let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
            let entries = collections.entry(collection.to_string()).or_default();

            for document in documents {
                entries.insert(document.id, document.fields);
            }
        }

        self
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());

        Ok(collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());

        Ok(collections
            .get(collection)
            .and_then(|entries| entries.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());

        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());

        let existing = collections
            .get_mut(collection)
            .and_then(|entries| entries.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        existing.extend(fields);

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());

        if let Some(entries) = collections.get_mut(collection) {
            entries.remove(id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_list_missing_collection_is_empty() {
        let store = MemoryStore::new();

        assert!(store.list(EVENTS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store
            .create(USERS, "1", fields(json!({ "name": "Asha", "email": "a@x.io" })))
            .await
            .unwrap();

        store
            .update(USERS, "1", fields(json!({ "email": "asha@x.io" })))
            .await
            .unwrap();

        let doc = store.get(USERS, "1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], "Asha");
        assert_eq!(doc.fields["email"], "asha@x.io");
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();

        let result = store.update(USERS, "nope", Fields::new()).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let store = MemoryStore::new().with_documents(
            USERS,
            vec![Document::new("1", fields(json!({ "name": "Asha" })))],
        );

        store.delete(USERS, "1").await.unwrap();

        assert!(store.get(USERS, "1").await.unwrap().is_none());
    }

    #[test]
    fn test_document_flattens_fields() {
        let doc = Document::new("7", fields(json!({ "name": "Ravi" })));

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "id": "7", "name": "Ravi" })
        );
    }
}
