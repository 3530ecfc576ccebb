//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::hazards::HazardProfile;
use crate::models::SourceDocument;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub generation_strategy: String,
}

/// Body of `POST /api/ingest`
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub documents: Vec<SourceDocument>,
}

/// One entry of `GET /api/hazards`
#[derive(Debug, Serialize)]
pub struct HazardInfo {
    pub key: &'static str,
    pub display_name: &'static str,
    pub requestable: bool,
}

impl From<&HazardProfile> for HazardInfo {
    fn from(profile: &HazardProfile) -> Self {
        Self {
            key: profile.key,
            display_name: profile.display_name,
            requestable: profile.requestable,
        }
    }
}
