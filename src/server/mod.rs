//! HTTP server: router assembly and lifecycle.

pub mod routes;
pub mod state;

use crate::config::ServiceConfig;
use crate::error::DocmillError;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use state::AppState;

/// The docmill HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server from a validated configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, DocmillError> {
        let state = AppState::new(config)?;
        Ok(Self { state })
    }

    /// Create a server over an existing state (tests inject mock
    /// clients this way).
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn start(self) -> Result<(), DocmillError> {
        let addr = self.state.config.listen_addr();
        let router = self.router();

        info!("Starting docmill server on http://{}", addr);

        let listener =
            tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| DocmillError::BindFailed {
                    addr: addr.clone(),
                    source: e,
                })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| DocmillError::Internal(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// Assemble the route table.
///
/// Upload routes carry the multipart body limit; the CORS layer is
/// permissive because the service has no authentication surface to
/// protect.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/hi", get(routes::hi))
        .route("/upload/", post(routes::upload).layer(body_limit.clone()))
        .route(
            "/upload/llama",
            post(routes::upload_llama).layer(body_limit.clone()),
        )
        .route(
            "/upload/analyze",
            post(routes::upload_analyze).layer(body_limit),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
