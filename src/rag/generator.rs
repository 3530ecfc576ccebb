//! Recommendation generation strategies
//!
//! Both strategies implement [`RecommendationGenerator`] and never fail: the
//! model-backed one substitutes [`fallback_recommendation`] for any remote,
//! parse or schema failure and marks the outcome as degraded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;
use tracing::warn;

use crate::config::GenerationStrategy;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::errors::ValidationErrors;
use crate::hazards::HazardCategory;
use crate::hazards::RECOMMENDATION_SOURCE;
use crate::llm::CompletionRequest;
use crate::llm::RecommendationPrompts;
use crate::llm::ResponseFormat;
use crate::llm::TextGenerator;
use crate::models::Recommendation;
use crate::models::RetrievedContext;
use crate::models::Severity;
use crate::validation::check_recommendation;
use crate::validation::validate_recommendation;

/// Provenance marker on fallback recommendations
pub const FALLBACK_SOURCE: &str = "Guardianly Safety Fallback";

const FALLBACK_ACTIONS: [&str; 3] = ["Stay alert", "Check local news", "Move to safety if unsure"];

/// Inputs for one generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub category: HazardCategory,
    pub display_name: &'a str,
    pub lat: f64,
    pub lng: f64,
    pub context: &'a RetrievedContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub recommendation: Recommendation,
    /// True when the fallback replaced the generated recommendation
    pub degraded: bool,
}

impl GenerationOutcome {
    fn generated(recommendation: Recommendation) -> Self {
        Self {
            recommendation,
            degraded: false,
        }
    }

    fn fallback(display_name: &str) -> Self {
        Self {
            recommendation: fallback_recommendation(display_name),
            degraded: true,
        }
    }
}

#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationOutcome;

    fn strategy(&self) -> GenerationStrategy;
}

/// Recommendation used whenever generation cannot produce a valid one
pub fn fallback_recommendation(display_name: &str) -> Recommendation {
    Recommendation {
        severity: Severity::Unknown,
        message: format!("Caution: {display_name} reported. Please proceed with care."),
        actions: FALLBACK_ACTIONS.iter().map(ToString::to_string).collect(),
        source: FALLBACK_SOURCE.to_string(),
    }
}

/// Canned recommendation per hazard
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicGenerator;

impl DeterministicGenerator {
    pub fn canned(category: HazardCategory, context: &RetrievedContext) -> Recommendation {
        let canned = &category.profile().canned;
        let mut actions: Vec<String> = canned.actions.iter().map(ToString::to_string).collect();
        if let Some(prefix) = canned.context_action {
            let tail = context.text().rsplit('|').next().unwrap_or_default().trim();
            actions.push(format!("{prefix}{tail}"));
        }

        Recommendation {
            severity: canned.severity,
            message: canned.message.to_string(),
            actions,
            source: RECOMMENDATION_SOURCE.to_string(),
        }
    }
}

#[async_trait]
impl RecommendationGenerator for DeterministicGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationOutcome {
        let recommendation = Self::canned(request.category, request.context);
        match check_recommendation(&recommendation) {
            Ok(()) => GenerationOutcome::generated(recommendation),
            Err(e) => {
                warn!("Canned recommendation for {} is invalid: {}", request.category, e);
                GenerationOutcome::fallback(request.display_name)
            }
        }
    }

    fn strategy(&self) -> GenerationStrategy {
        GenerationStrategy::Deterministic
    }
}

/// Remote model constrained to JSON output, validated before use
pub struct ModelBackedGenerator {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ModelBackedGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        temperature: f32,
        max_tokens: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            temperature,
            max_tokens,
            timeout,
        }
    }

    fn user_message(request: &GenerationRequest<'_>) -> String {
        let values = HashMap::from([
            ("hazard", request.display_name.to_string()),
            ("lat", request.lat.to_string()),
            ("lng", request.lng.to_string()),
            ("context", request.context.text().to_string()),
        ]);
        RecommendationPrompts::hazard_alert().render(&values)
    }

    /// Generation with every failure propagated
    pub async fn try_generate(&self, request: &GenerationRequest<'_>) -> Result<Recommendation> {
        let user = Self::user_message(request);
        let completion = CompletionRequest {
            system: RecommendationPrompts::system(),
            user: &user,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat::Json,
        };

        let started = Instant::now();
        let raw = tokio::time::timeout(self.timeout, self.generator.complete(&completion))
            .await
            .map_err(|_| GuardianlyError::Timeout {
                operation: "recommendation generation",
                elapsed: started.elapsed(),
            })??;
        debug!("Model responded in {}ms", started.elapsed().as_millis());

        let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| {
            GuardianlyError::GenerationError(format!("model output is not JSON: {e}"))
        })?;
        let recommendation = validate_recommendation(&value)?;
        ensure_provenance(&recommendation)?;
        Ok(recommendation)
    }
}

/// Model output must carry the fixed authorship marker
fn ensure_provenance(recommendation: &Recommendation) -> Result<()> {
    if recommendation.source == RECOMMENDATION_SOURCE {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    errors.add("source", format!("Must be '{RECOMMENDATION_SOURCE}'."));
    Err(GuardianlyError::Schema(errors))
}

#[async_trait]
impl RecommendationGenerator for ModelBackedGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationOutcome {
        match self.try_generate(request).await {
            Ok(recommendation) => GenerationOutcome::generated(recommendation),
            Err(e) => {
                warn!("Falling back for {}: {}", request.category, e);
                GenerationOutcome::fallback(request.display_name)
            }
        }
    }

    fn strategy(&self) -> GenerationStrategy {
        GenerationStrategy::Model
    }
}
