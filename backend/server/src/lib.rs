//! Alumni network backend.
//!
//! # General Infrastructure
//! - Frontend and CLI talk to this server over JSON
//! - An authenticating proxy sits in front and sets `X-User-Id` / `X-User-Role`
//! - Redis holds every collection, one hash per collection
//! - The chatbot calls out to an OpenAI-compatible chat completion endpoint
//!
//!
//!
//! # Routes
//!
//! | Method | Path | Who |
//! |---|---|---|
//! | POST | `/api/chatbot` | anyone |
//! | GET | `/api/users` | anyone |
//! | GET | `/api/users/{id}` | anyone |
//! | POST | `/api/users` | admin |
//! | PUT | `/api/users/{id}` | admin |
//! | PATCH | `/api/users/{id}` | admin |
//! | DELETE | `/api/users/{id}` | admin |
//! | GET | `/health` | anyone |
//!
//! Errors are always `{ "error": "..." }`. Upstream failures only ever show a
//! generic message, the detail goes to the logs.
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `5000` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `OPENAI_API_KEY` | `/run/secrets/OPENAI_API_KEY`, then env |
//! | `OPENAI_MODEL` | `gpt-4o-mini` |
//! | `OPENAI_URL` | `https://api.openai.com/v1` |
//! | `RUST_LOG` | unset |
//!
//!
//!
//! # Setup
//!
//! Run locally against a local Redis.
//! ```sh
//! docker run -d -p 6379:6379 redis
//! OPENAI_API_KEY=... RUST_LOG=info cargo run -p alumni
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod chatbot;
pub mod completion;
pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use routes::{
    chatbot_handler, create_user_handler, delete_user_handler, get_user_handler, health_handler,
    list_users_handler, patch_user_handler, put_user_handler,
};
use state::State;
use utils::{USER_ID_HEADER, USER_ROLE_HEADER};

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chatbot", post(chatbot_handler))
        .route(
            "/api/users",
            get(list_users_handler).post(create_user_handler),
        )
        .route(
            "/api/users/{id}",
            get(get_user_handler)
                .put(put_user_handler)
                .patch(patch_user_handler)
                .delete(delete_user_handler),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
