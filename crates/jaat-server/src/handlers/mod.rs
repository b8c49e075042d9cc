//! HTTP route handlers for the relay server.

pub mod assets;
pub mod chat;
pub mod features;

use axum::Json;

use crate::dto::HealthResponse;

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: Some("JAAT-AI server is running"),
    })
}
