//! HTTP server implementation

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::BoxError;
use axum::Json;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::api::types::ApiResponse;
use crate::config::AppConfig;
use crate::config::ServerConfig;
use crate::services::AppServices;
use crate::Result;

/// Assemble the full router: `/api/*`, root `/health` and middleware
///
/// Bounded routes answer 408 once `server.request_timeout_secs` elapses.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let request_timeout = Duration::from_secs(server.request_timeout_secs);
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone())
        .nest("/api", routes::api_routes(state, request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if server.cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

pub(crate) async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ApiResponse<()>>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ApiResponse::error("Request timed out")),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Unhandled internal error: {err}"))),
        )
    }
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("Starting Guardianly API server...");

    let services = AppServices::from_config(config)?;
    let server = ServerConfig {
        host: host.clone(),
        port,
        cors: enable_cors || config.server.cors,
        request_timeout_secs: config.server.request_timeout_secs,
    };
    let app = build_router(services, &server);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health                       - Health check");
    info!("  GET  /api/hazards                  - Canonical hazard set");
    info!("  POST /api/generate_recommendation  - Safety recommendation");
    info!("  POST /api/generate_prompt          - Alias of the above");
    info!("  POST /api/ingest                   - Ingest playbooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
