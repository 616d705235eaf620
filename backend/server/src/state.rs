use std::sync::Arc;

use anyhow::Result;
use directory::DocumentStore;
use tracing::info;

use super::{
    completion::{ChatCompletion, OpenAiClient},
    config::Config,
    database::{RedisStore, init_redis},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub completion: Arc<dyn ChatCompletion>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let redis_connection = init_redis(&config.redis_url).await?;
        info!("Connected to Redis at {}", config.redis_url);

        let completion = OpenAiClient::new(
            &config.openai_key,
            &config.openai_model,
            &config.openai_url,
        );

        Ok(Arc::new(Self {
            store: Arc::new(RedisStore::new(redis_connection)),
            completion: Arc::new(completion),
            config,
        }))
    }

    /// Wires arbitrary collaborators, used by tests.
    pub fn with(
        config: Config,
        store: Arc<dyn DocumentStore>,
        completion: Arc<dyn ChatCompletion>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            completion,
        })
    }
}
