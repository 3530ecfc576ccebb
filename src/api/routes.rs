//! API route definitions

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;

use super::handlers;
use super::handlers::AppState;
use super::server::handle_middleware_error;

/// Largest accepted ingest body
const MAX_INGEST_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Create RESTful API router
///
/// `request_timeout` bounds every route except `/ingest`, which always runs
/// to completion so the caller receives the full report.
pub fn api_routes(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/hazards", get(handlers::list_hazards))
        // Recommendation endpoint and its legacy alias
        .route(
            "/generate_recommendation",
            post(handlers::generate_recommendation),
        )
        .route("/generate_prompt", post(handlers::generate_recommendation))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(request_timeout),
        )
        .route(
            "/ingest",
            post(handlers::ingest).layer(DefaultBodyLimit::max(MAX_INGEST_BODY_BYTES)),
        )
        .with_state(state)
}
