//! HTTP server relaying chat messages to an LLM API and serving the
//! JAAT-AI front end.
//!
//! The router is exposed separately from the binary so it can be driven
//! in tests without binding a socket.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use jaat_config::{ConfigError, FeatureRegistry, ServerConfig};
use jaat_llm::CompletionBackend;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::services::assets::AssetStore;
use crate::services::chat::ChatService;

/// Shared server state accessible from all handlers. Immutable after startup.
pub struct ServerState {
    pub config: ServerConfig,
    pub chat: ChatService,
    pub features: FeatureRegistry,
    pub assets: AssetStore,
}

impl ServerState {
    /// Builds the state with the OpenAI-compatible completion client.
    pub fn from_config(config: ServerConfig) -> Result<Self, ConfigError> {
        let chat = ChatService::from_config(&config);
        Self::assemble(config, chat)
    }

    /// Builds the state around a caller-supplied completion backend.
    pub fn with_backend(
        config: ServerConfig,
        backend: Arc<dyn CompletionBackend>,
    ) -> Result<Self, ConfigError> {
        let chat = ChatService::new(backend, config.has_credential(), config.upstream_timeout);
        Self::assemble(config, chat)
    }

    fn assemble(config: ServerConfig, chat: ChatService) -> Result<Self, ConfigError> {
        let features = FeatureRegistry::load(config.features_manifest.as_deref())?;
        let assets = AssetStore::new(config.asset_roots());
        Ok(Self { config, chat, features, assets })
    }
}

/// Builds the application router.
pub fn app(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/features", get(handlers::features::list))
        .route("/api/modes", get(handlers::features::modes))
        .route("/", get(handlers::assets::index))
        .route("/{*path}", get(handlers::assets::asset))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}
