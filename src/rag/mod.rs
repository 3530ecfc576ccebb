//! Retrieval-augmented recommendation pipeline
//!
//! - [`Retriever`] embeds a hazard query and fetches the nearest playbooks
//! - [`ContextAssembler`] joins their text, or yields a sentinel
//! - [`RecommendationGenerator`] strategies turn context into a validated
//!   [`Recommendation`](crate::models::Recommendation), falling back when needed
//! - [`RecommendationService`] wires them into the request handler
//!
//! # Examples
//!
//! ```rust,no_run
//! use guardianly::config::AppConfig;
//! use guardianly::services::AppServices;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let services = AppServices::from_config(&config)?;
//!
//!     let body = br#"{"hazard": "Road Closure", "user_lat": 44.95, "user_lng": -123.03}"#;
//!     let (status, json) = services.recommendations.handle_generate_recommendation(body).await;
//!     println!("{status}: {json}");
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod generator;
pub mod pipeline;
pub mod retriever;

pub use context::ContextAssembler;
pub use context::CONTEXT_SEPARATOR;
pub use generator::fallback_recommendation;
pub use generator::DeterministicGenerator;
pub use generator::GenerationOutcome;
pub use generator::GenerationRequest;
pub use generator::ModelBackedGenerator;
pub use generator::RecommendationGenerator;
pub use generator::FALLBACK_SOURCE;
pub use pipeline::ErrorResponse;
pub use pipeline::RecommendationResponse;
pub use pipeline::RecommendationService;
pub use pipeline::ResponseStatus;
pub use retriever::Retriever;
