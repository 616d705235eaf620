use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use directory::{
    Document, DocumentStore, Fields, MemberForm,
    member::{authorize, new_member_id, sanitize_patch, validate_document},
    store::USERS,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::{chatbot::answer, error::AppError, state::State as AppState, utils::CurrentActor};

#[derive(Deserialize)]
pub struct ChatbotRequest {
    message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatbotReply {
    reply: String,
}

pub async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn chatbot_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatbotRequest>, JsonRejection>,
) -> Result<Json<ChatbotReply>, AppError> {
    let Json(payload) = payload.map_err(|_| AppError::MalformedPayload)?;

    let message = payload
        .message
        .filter(|m| !m.is_empty())
        .ok_or(AppError::MissingMessage)?;

    let reply = answer(state.store.as_ref(), state.completion.as_ref(), &message).await?;

    Ok(Json(ChatbotReply { reply }))
}

pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(state.store.list(USERS).await?))
}

pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    state
        .store
        .get(USERS, &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// Server-assigned id and provenance.
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<MemberForm>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = authorize(actor.as_ref())?;
    let Json(form) = payload.map_err(|_| AppError::MalformedPayload)?;
    form.validate()?;

    let now = Utc::now();
    let id = new_member_id(now);
    state
        .store
        .create(USERS, &id, form.into_new_document(actor, now))
        .await?;

    info!("User {id} created by {}", actor.uid);

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

fn object(payload: Result<Json<Value>, JsonRejection>) -> Result<Fields, AppError> {
    match payload {
        Ok(Json(Value::Object(fields))) => Ok(fields),
        _ => Err(AppError::MalformedPayload),
    }
}

/// Create-with-id: the caller picked the id and stamped provenance.
pub async fn put_user_handler(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let actor = authorize(actor.as_ref())?;
    let fields = object(payload)?;
    validate_document(&fields)?;

    state.store.create(USERS, &id, fields).await?;
    info!("User {id} written by {}", actor.uid);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn patch_user_handler(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let actor = authorize(actor.as_ref())?;
    let fields = sanitize_patch(object(payload)?)?;

    match state.store.update(USERS, &id, fields).await {
        Ok(()) => {
            info!("User {id} updated by {}", actor.uid);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(directory::StoreError::NotFound { .. }) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let actor = authorize(actor.as_ref())?;

    state.store.delete(USERS, &id).await?;
    info!("User {id} deleted by {}", actor.uid);

    Ok(StatusCode::NO_CONTENT)
}
