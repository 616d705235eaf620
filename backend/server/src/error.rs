use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use directory::{DirectoryError, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::completion::CompletionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Message is required")]
    MissingMessage,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Error contacting AI")]
    Chatbot(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Internal error")]
    Store(#[from] StoreError),
}

impl From<CompletionError> for AppError {
    fn from(e: CompletionError) -> Self {
        AppError::Chatbot(Box::new(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload | AppError::MissingMessage => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Directory(DirectoryError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Directory(DirectoryError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::Directory(DirectoryError::Upstream { .. })
            | AppError::Chatbot(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(source) => error!("{self}: {source}"),
                None => error!("{self}"),
            }
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
