//! Pinecone REST client
//!
//! Control-plane calls (list/create index) go to `control_plane_url`; data
//! calls (upsert/query) go to the per-index host, which is either configured
//! or resolved once from the control plane.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Response;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::IndexSpec;
use super::Metric;
use super::VectorIndex;
use crate::config::VectorIndexConfig;
use crate::errors::GuardianlyError;
use crate::errors::Result;
use crate::models::IndexMatch;
use crate::models::VectorMetadata;
use crate::models::VectorRecord;

const API_VERSION: &str = "2024-07";

/// Pinecone accepts at most this many vectors per upsert request
const MAX_UPSERT_BATCH: usize = 100;

pub struct PineconeIndex {
    client: Client,
    api_key: String,
    control_plane_url: String,
    index_name: String,
    cloud: String,
    region: String,
    host: OnceCell<String>,
}

impl PineconeIndex {
    pub fn new(config: &VectorIndexConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GuardianlyError::ConfigError(
                "vector_index.api_key (or PINECONE_API_KEY) is required for the pinecone backend"
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuardianlyError::HttpError(e.to_string()))?;

        let host = OnceCell::new();
        if let Some(configured) = config.host.as_deref().filter(|h| !h.trim().is_empty()) {
            // Fresh cell, cannot already be set
            let _ = host.set(normalize_host(configured));
        }

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            host,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            indexes: Vec<IndexDescription>,
        }

        let url = format!("{}/indexes", self.control_plane_url);
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| GuardianlyError::IndexError(format!("list indexes failed: {e}")))?;
        let body = read_success(response, "list indexes").await?;
        let parsed: ListResponse = serde_json::from_str(&body)
            .map_err(|e| GuardianlyError::IndexError(format!("invalid list response: {e}")))?;
        Ok(parsed.indexes)
    }

    async fn describe_index(&self) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.index_name);
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| GuardianlyError::IndexError(format!("describe index failed: {e}")))?;
        let body = read_success(response, "describe index").await?;
        serde_json::from_str(&body)
            .map_err(|e| GuardianlyError::IndexError(format!("invalid describe response: {e}")))
    }

    /// Data-plane base URL, resolved on first use
    async fn data_plane(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let description = self.describe_index().await?;
                let host = description.host.filter(|h| !h.is_empty()).ok_or_else(|| {
                    GuardianlyError::IndexError(format!(
                        "index {} has no data-plane host yet",
                        self.index_name
                    ))
                })?;
                debug!("Resolved Pinecone host for {}: {}", self.index_name, host);
                Ok::<_, GuardianlyError>(normalize_host(&host))
            })
            .await?;
        Ok(host.as_str())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<bool> {
        let existing = self.list_indexes().await?;
        if let Some(index) = existing.iter().find(|index| index.name == spec.name) {
            info!("Index {} already exists.", spec.name);
            if let Some(dimension) = index.dimension {
                if dimension != spec.dimension {
                    return Err(GuardianlyError::IndexError(format!(
                        "index {} exists with dimension {dimension}, expected {}",
                        spec.name, spec.dimension
                    )));
                }
            }
            return Ok(false);
        }

        info!("Creating index: {}...", spec.name);
        let request = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: ServerlessSpecWrapper {
                serverless: ServerlessSpec {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };

        let url = format!("{}/indexes", self.control_plane_url);
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GuardianlyError::IndexError(format!("create index failed: {e}")))?;

        // Another ingestion run may have created it between list and create
        if response.status() == StatusCode::CONFLICT {
            info!("Index {} was created concurrently.", spec.name);
            return Ok(false);
        }
        read_success(response, "create index").await?;
        Ok(true)
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let url = format!("{}/vectors/upsert", self.data_plane().await?);

        for batch in records.chunks(MAX_UPSERT_BATCH) {
            #[derive(Serialize)]
            struct UpsertRequest<'a> {
                vectors: &'a [VectorRecord],
            }

            let response = self
                .request(reqwest::Method::POST, &url)
                .json(&UpsertRequest { vectors: batch })
                .send()
                .await
                .map_err(|e| GuardianlyError::IndexError(format!("upsert failed: {e}")))?;
            read_success(response, "upsert").await?;
            debug!("Upserted {} vectors into {}", batch.len(), self.index_name);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct QueryRequest<'a> {
            vector: &'a [f32],
            top_k: usize,
            include_metadata: bool,
            include_values: bool,
        }

        let url = format!("{}/query", self.data_plane().await?);
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata,
                include_values: false,
            })
            .send()
            .await
            .map_err(|e| GuardianlyError::IndexError(format!("query failed: {e}")))?;
        let body = read_success(response, "query").await?;
        parse_query_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    host: Option<String>,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: ServerlessSpecWrapper<'a>,
}

#[derive(Serialize)]
struct ServerlessSpecWrapper<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn read_success(response: Response, operation: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    if status.is_success() {
        Ok(body)
    } else {
        Err(GuardianlyError::IndexError(format!(
            "Pinecone {operation} failed ({status}): {body}"
        )))
    }
}

/// Parse query matches, tolerating records written by other tools
fn parse_query_response(body: &str) -> Result<Vec<IndexMatch>> {
    #[derive(Deserialize)]
    struct QueryResponse {
        #[serde(default)]
        matches: Vec<RawMatch>,
    }

    #[derive(Deserialize)]
    struct RawMatch {
        id: String,
        #[serde(default)]
        score: f32,
        #[serde(default)]
        metadata: Option<Map<String, Value>>,
    }

    let parsed: QueryResponse = serde_json::from_str(body)
        .map_err(|e| GuardianlyError::IndexError(format!("invalid query response: {e}")))?;

    Ok(parsed
        .matches
        .into_iter()
        .map(|raw| {
            let metadata = raw.metadata.and_then(|map| {
                let text = map.get("text")?.as_str()?.to_string();
                let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                Some(VectorMetadata {
                    text,
                    hazard: field("hazard").unwrap_or_else(|| "general".to_string()),
                    source: field("source").unwrap_or_else(|| raw.id.clone()),
                })
            });
            IndexMatch {
                id: raw.id,
                score: raw.score,
                metadata,
            }
        })
        .collect())
}
