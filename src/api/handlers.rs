//! API request handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::info;
use tracing::warn;

use crate::api::types::ApiResponse;
use crate::api::types::HazardInfo;
use crate::api::types::HealthResponse;
use crate::api::types::IngestRequest;
use crate::hazards::HAZARD_PROFILES;
use crate::models::IngestReport;
use crate::services::AppServices;

/// Shared application state
pub type AppState = AppServices;

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let strategy = state.recommendations.generator().strategy();
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generation_strategy: format!("{strategy:?}").to_lowercase(),
    }))
}

/// Generate a recommendation (POST /api/generate_recommendation)
///
/// The body is taken raw so malformed JSON gets the same 400 shape as
/// field-level validation errors.
pub async fn generate_recommendation(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let (status, body) = state
        .recommendations
        .handle_generate_recommendation(&body)
        .await;
    (status, Json(body))
}

/// Ingest playbooks (POST /api/ingest)
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse<IngestReport>>) {
    let request: IngestRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected ingest request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid ingest request: {e}"))),
            );
        }
    };

    info!("API ingest: {} documents", request.documents.len());
    let report = state.loader.ingest(request.documents).await;
    (StatusCode::OK, Json(ApiResponse::success(report)))
}

/// List the canonical hazard set (GET /api/hazards)
pub async fn list_hazards() -> Json<ApiResponse<Vec<HazardInfo>>> {
    Json(ApiResponse::success(
        HAZARD_PROFILES.iter().map(HazardInfo::from).collect(),
    ))
}
