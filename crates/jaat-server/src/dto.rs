//! Data transfer objects for HTTP message serialization.

use jaat_core::ChatTurn;
use serde::{Deserialize, Serialize};

// === Chat Types ===

/// Request body for the chat endpoint.
///
/// Every field is optional on the wire so that a missing message can be
/// reported as a validation error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

/// Response body for every handled chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub mode: String,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>, mode: impl Into<String>) -> Self {
        Self { response: response.into(), mode: mode.into() }
    }
}

// === Health ===

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}
