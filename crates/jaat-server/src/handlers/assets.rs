//! Static file handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::services::assets::{Asset, AssetError};
use crate::ServerState;

/// Serves the entry document.
pub async fn index(State(state): State<Arc<ServerState>>) -> Response {
    render(state.assets.entry().await)
}

/// Serves any other file under the asset roots.
pub async fn asset(State(state): State<Arc<ServerState>>, Path(path): Path<String>) -> Response {
    render(state.assets.resolve(&path).await)
}

fn render(result: Result<Asset, AssetError>) -> Response {
    match result {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response(),
        Err(AssetError::NotFound(path)) => {
            debug!("Asset not found: {}", path);
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
        Err(e) => {
            error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response()
        }
    }
}
