//! Guardianly hazard-alerting backend
//!
//! Given a hazard and a user location, Guardianly retrieves matching safety
//! playbooks from a vector index and turns them into a structured,
//! severity-ranked recommendation. Playbooks are loaded offline by
//! [`ingest::PlaybookLoader`]; requests are served by
//! [`rag::RecommendationService`], directly or through the [`api`] router.

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod hazards;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod services;
pub mod validation;
pub mod vector_index;

#[cfg(test)]
mod validation_tests;

pub use config::AppConfig;
pub use errors::*;
pub use services::AppServices;
