//! Chat endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::warn;

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::ServerState;

/// Relays a chat message to the completion API.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Rejected chat body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    })?;

    let response = state.chat.handle(req).await?;
    Ok(Json(response))
}
