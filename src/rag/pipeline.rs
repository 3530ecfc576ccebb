//! Request pipeline: Validate -> Retrieve -> Generate

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::errors::ValidationErrors;
use crate::hazards::allowed_display_names;
use crate::hazards::HazardCategory;
use crate::models::HazardQuery;
use crate::models::Recommendation;
use crate::models::RetrievedContext;
use crate::rag::GenerationRequest;
use crate::rag::RecommendationGenerator;
use crate::rag::Retriever;
use crate::validation::validate_request;
use crate::validation::INVALID_INPUT;
use crate::validation::SCHEMA_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    /// The fallback recommendation was served
    Warning,
}

/// Success body of the generate-recommendation operation
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub status: ResponseStatus,
    /// Display name of the resolved hazard
    pub hazard: String,
    pub retrieved_context: RetrievedContext,
    pub recommendation: Recommendation,
}

/// Client-error body: `{error, messages}` or `{error, allowed}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<&'static str>>,
}

impl ErrorResponse {
    pub fn from_error(error: &GuardianlyError) -> Self {
        match error {
            GuardianlyError::RequestValidation(messages) => Self {
                error: "Invalid input data".to_string(),
                messages: Some(messages.clone()),
                allowed: None,
            },
            GuardianlyError::UnknownHazard(_) => Self {
                error: error.to_string(),
                messages: None,
                allowed: Some(allowed_display_names()),
            },
            other => Self {
                error: other.to_string(),
                messages: None,
                allowed: None,
            },
        }
    }
}

/// Request-scoped orchestration over injected retriever and generator
pub struct RecommendationService {
    retriever: Retriever,
    generator: Arc<dyn RecommendationGenerator>,
}

impl RecommendationService {
    pub fn new(retriever: Retriever, generator: Arc<dyn RecommendationGenerator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn generator(&self) -> &dyn RecommendationGenerator {
        self.generator.as_ref()
    }

    /// Handle a raw request body, producing the HTTP status and JSON body
    ///
    /// Only malformed input and unknown hazards are client errors; every
    /// well-formed request for a known hazard gets a 200.
    pub async fn handle_generate_recommendation(&self, raw: &[u8]) -> (StatusCode, Value) {
        let request_id = Uuid::new_v4();
        let span = info_span!("recommendation", %request_id);

        async {
            match self.parse_and_recommend(raw).await {
                Ok(response) => (StatusCode::OK, to_json(&response)),
                Err(e) => {
                    let status = if e.is_client_error() {
                        StatusCode::BAD_REQUEST
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR
                    };
                    warn!("Rejected recommendation request: {}", e);
                    (status, to_json(&ErrorResponse::from_error(&e)))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn parse_and_recommend(&self, raw: &[u8]) -> Result<RecommendationResponse> {
        let body: Value = serde_json::from_slice(raw).map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add(SCHEMA_KEY, INVALID_INPUT);
            GuardianlyError::RequestValidation(errors)
        })?;
        let query = validate_request(&body)?;
        self.recommend(&query).await
    }

    /// Resolve, retrieve and generate for an already validated query
    ///
    /// Fails only with `UnknownHazard`, before any remote call.
    pub async fn recommend(&self, query: &HazardQuery) -> Result<RecommendationResponse> {
        let category = HazardCategory::resolve(&query.hazard_type)?;
        let display_name = category.display_name();

        let context = self
            .retriever
            .retrieve(category, query.user_lat, query.user_lng)
            .await;

        let outcome = self
            .generator
            .generate(&GenerationRequest {
                category,
                display_name,
                lat: query.user_lat,
                lng: query.user_lng,
                context: &context,
            })
            .await;

        let status = if outcome.degraded {
            ResponseStatus::Warning
        } else {
            ResponseStatus::Success
        };
        info!(
            "Recommendation for {}: severity={} status={:?} grounded={}",
            category,
            outcome.recommendation.severity,
            status,
            context.is_grounded()
        );

        Ok(RecommendationResponse {
            status,
            hazard: display_name.to_string(),
            retrieved_context: context,
            recommendation: outcome.recommendation,
        })
    }
}

fn to_json<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body)
        .unwrap_or_else(|e| serde_json::json!({ "error": format!("Failed to serialize response: {e}") }))
}
