//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - serve: API server
//! - ingest: playbook ingestion
//! - recommend: one-off recommendations
//! - info: hazards and configuration display

pub mod info;
pub mod ingest;
pub mod recommend;
pub mod serve;

// Re-export all public handlers
pub use info::*;
pub use ingest::*;
pub use recommend::*;
pub use serve::*;
