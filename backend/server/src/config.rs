use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub openai_key: String,
    pub openai_model: String,
    pub openai_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let openai_key = read_secret("OPENAI_API_KEY").unwrap_or_else(|| {
            warn!("OPENAI_API_KEY not set, chatbot requests will fail");
            String::new()
        });
        info!(
            "Loaded API Key: {}",
            if openai_key.is_empty() { "Missing" } else { "Present" }
        );

        Ok(Self {
            port: try_load("RUST_PORT", "5000")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            openai_key,
            openai_model: try_load("OPENAI_MODEL", "gpt-4o-mini")?,
            openai_url: try_load("OPENAI_URL", "https://api.openai.com/v1")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("Environment misconfigured: {key}")
        })
}

/// Docker secret first, then the plain environment variable.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => Some(secret.trim().to_string()),
        Err(e) => {
            info!("No {secret_name} secret file ({e}), trying the environment");

            var(secret_name).map(|s| s.trim().to_string())
        }
    }
}
