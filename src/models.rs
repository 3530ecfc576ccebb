use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::hazards::HazardCategory;

/// Sentinel context returned when the index has no matching playbook
pub const NO_PLAYBOOK_FOUND: &str = "No specific playbook found.";

/// Sentinel context returned when embedding or index search failed
pub const CONTEXT_RETRIEVAL_FAILED: &str = "Context retrieval failed.";

/// Severity of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Moderate,
    Low,
    /// Only produced by the generator fallback
    Unknown,
}

impl Severity {
    /// Severities a validated recommendation may carry
    pub const CANONICAL: [Self; 3] = [Self::High, Self::Moderate, Self::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse one of the canonical values; `Unknown` is never accepted from input
    pub fn parse_canonical(value: &str) -> Option<Self> {
        Self::CANONICAL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured recommendation returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
    pub actions: Vec<String>,
    pub source: String,
}

/// Validated per-request input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardQuery {
    /// Raw client-supplied hazard text
    pub hazard_type: String,
    pub user_lat: f64,
    pub user_lng: f64,
}

impl HazardQuery {
    pub fn normalized_hazard(&self) -> String {
        crate::hazards::normalize_hazard_key(&self.hazard_type)
    }
}

/// Grounding text for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievedContext {
    /// Matched playbook text joined with the context separator
    Grounded(String),
    /// The index answered but returned nothing usable
    NoMatches,
    /// Embedding or index search failed; generation runs degraded
    RetrievalFailed,
}

impl RetrievedContext {
    pub fn text(&self) -> &str {
        match self {
            Self::Grounded(text) => text,
            Self::NoMatches => NO_PLAYBOOK_FOUND,
            Self::RetrievalFailed => CONTEXT_RETRIEVAL_FAILED,
        }
    }

    pub const fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded(_))
    }
}

impl fmt::Display for RetrievedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for RetrievedContext {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

/// A raw playbook handed to the loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Source filename; documents without one are identified by content hash
    #[serde(default)]
    pub filename: Option<String>,
    pub text: String,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            text: text.into(),
        }
    }
}

/// A tagged, embedded playbook ready for upsert
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDocument {
    pub id: String,
    pub text: String,
    pub hazard_category: HazardCategory,
    pub source: String,
    pub embedding: Vec<f32>,
}

impl ProcedureDocument {
    pub fn into_record(self) -> VectorRecord {
        VectorRecord {
            id: self.id,
            values: self.embedding,
            metadata: VectorMetadata {
                text: self.text,
                hazard: self.hazard_category.key().to_string(),
                source: self.source,
            },
        }
    }
}

/// Metadata stored alongside each vector; field names are part of the index schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub text: String,
    pub hazard: String,
    pub source: String,
}

/// Vector index entry `{id, values, metadata}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// One similarity-search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<VectorMetadata>,
}

/// Stage at which a document failed to ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Embedding,
    Upsert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFailure {
    pub id: String,
    pub stage: IngestStage,
    pub error: String,
}

/// Per-document outcome of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub index_name: String,
    /// Whether this run created the index
    pub index_created: bool,
    /// Index setup failure; documents are still attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_error: Option<String>,
    pub indexed: Vec<String>,
    pub failed: Vec<IngestFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.indexed.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.index_error.is_none()
    }
}
