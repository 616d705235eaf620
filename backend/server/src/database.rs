//! # Redis
//!
//! Document store backing every collection.
//!
//! ## Layout
//!
//! - One Redis hash per collection (`users`, `events`, ...)
//! - Hash field: document id
//! - Hash value: the document's fields as a JSON object
//!
//! ## Notes
//!
//! - Updates are read-merge-write. Two admins editing the same member at the
//!   same moment can lose one of the edits, same as the last-write-wins
//!   behavior of the UI.
//! - Listing is a single `HGETALL`, so order follows Redis, not insertion.
use std::time::Duration;

use async_trait::async_trait;
use directory::{Document, DocumentStore, Fields, StoreError};
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;

    client.get_connection_manager_with_config(config).await
}

fn backend(e: RedisError) -> StoreError {
    StoreError::Backend(Box::new(e))
}

fn decode(id: String, raw: &str) -> Result<Document, StoreError> {
    let fields: Fields = serde_json::from_str(raw)?;

    Ok(Document::new(id, fields))
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut connection = self.connection.clone();

        let entries: Vec<(String, String)> =
            connection.hgetall(collection).await.map_err(backend)?;

        entries
            .into_iter()
            .map(|(id, raw)| decode(id, &raw))
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut connection = self.connection.clone();

        let raw: Option<String> = connection.hget(collection, id).await.map_err(backend)?;

        raw.map(|raw| decode(id.to_string(), &raw)).transpose()
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let raw = serde_json::to_string(&fields)?;

        let _: () = connection
            .hset(collection, id, raw)
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut existing = self
            .get(collection, id)
            .await?
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        existing.fields.extend(fields);

        self.create(collection, id, existing.fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: i64 = connection.hdel(collection, id).await.map_err(backend)?;

        Ok(())
    }
}
