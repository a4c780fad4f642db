//! HTTP surface of the service.
//!
//! - GET  /, /health                      - liveness
//! - GET  /api/iris/{health,test,debug,data}
//! - GET  /api/spectrum/{health,demo,debug}, POST /api/spectrum/analyze
//! - GET  /api/loom/{health,demo,systems,debug}, POST /api/loom/generate

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::core::ScriptRunner;
use crate::utils::error::{ConfluenceError, Result};

pub use error::{ApiJson, ErrorResponse};
pub use state::AppState;

/// Credentials are allowed, so methods and headers are mirrored instead of wildcarded.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfluenceError::ConfigError {
                field: "server.cors_origins".to_string(),
                message: format!("Invalid origin '{}': {}", origin, e),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let router = routes::root::router()
        .nest("/api/iris", routes::iris::router())
        .nest("/api/spectrum", routes::spectrum::router())
        .nest("/api/loom", routes::loom::router())
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins)?),
        );

    Ok(router)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig, runner: Arc<dyn ScriptRunner>) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::new(runner, &config);
    let router = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ConfluenceError::ServerError {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;

    tracing::info!("🚀 Confluence listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConfluenceError::ServerError {
            message: format!("Server error: {}", e),
        })?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // 無法監聽訊號時持續服務
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
