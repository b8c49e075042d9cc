//! Feature and mode listing.

use std::sync::Arc;

use axum::{extract::State, Json};
use jaat_config::FeatureDescriptor;

use crate::ServerState;

/// Lists every advertised feature and mode.
pub async fn list(State(state): State<Arc<ServerState>>) -> Json<Vec<FeatureDescriptor>> {
    Json(state.features.list().to_vec())
}

/// Lists only the assistant modes.
pub async fn modes(State(state): State<Arc<ServerState>>) -> Json<Vec<FeatureDescriptor>> {
    Json(state.features.modes().cloned().collect())
}
