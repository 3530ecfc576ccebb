//! Embedding API clients for the supported providers

use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::GuardianlyError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API (or any compatible endpoint)
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

impl FromStr for EmbeddingProvider {
    type Err = GuardianlyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(GuardianlyError::ConfigError(format!(
                "unknown embedding provider '{other}' (expected openai or ollama)"
            ))),
        }
    }
}

/// HTTP client for a single embedding provider
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GuardianlyError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            client,
        })
    }

    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, empty data)
    /// - Provider-specific errors (rate limits, quota exceeded, invalid model)
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_openai(text).await,
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embedding using `OpenAI` API
    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            GuardianlyError::ConfigError("OpenAI API key not provided".to_string())
        })?;

        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a str,
            model: &'a str,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {}", url);

        let request = OpenAIRequest {
            input: text,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GuardianlyError::EmbeddingError(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GuardianlyError::EmbeddingError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GuardianlyError::EmbeddingError(format!("Failed to read response: {e}")))?;
        parse_openai_embedding(&body)
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GuardianlyError::EmbeddingError(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GuardianlyError::EmbeddingError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GuardianlyError::EmbeddingError(format!("Failed to read response: {e}")))?;
        parse_ollama_embedding(&body)
    }
}

fn parse_openai_embedding(body: &str) -> Result<Vec<f32>> {
    #[derive(Deserialize)]
    struct OpenAIResponse {
        data: Vec<EmbeddingData>,
    }

    #[derive(Deserialize)]
    struct EmbeddingData {
        embedding: Vec<f32>,
    }

    let result: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| GuardianlyError::EmbeddingError(format!("Failed to parse response: {e}")))?;

    result
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| GuardianlyError::EmbeddingError("No embedding in response".to_string()))
}

fn parse_ollama_embedding(body: &str) -> Result<Vec<f32>> {
    #[derive(Deserialize)]
    struct OllamaResponse {
        embedding: Vec<f32>,
    }

    let result: OllamaResponse = serde_json::from_str(body)
        .map_err(|e| GuardianlyError::EmbeddingError(format!("Failed to parse response: {e}")))?;
    Ok(result.embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::OpenAI);
        assert_eq!(" ollama ".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Ollama);
        assert!("cohere".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_parse_openai_embedding() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,-0.2,0.3]}],"model":"text-embedding-3-small"}"#;
        assert_eq!(parse_openai_embedding(body).unwrap(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_openai_empty_data() {
        let err = parse_openai_embedding(r#"{"data":[]}"#).unwrap_err();
        assert!(err.to_string().contains("No embedding"));
    }

    #[test]
    fn test_parse_ollama_embedding() {
        assert_eq!(
            parse_ollama_embedding(r#"{"embedding":[1.0,2.0]}"#).unwrap(),
            vec![1.0, 2.0]
        );
        assert!(parse_ollama_embedding("<html>").is_err());
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_openai_embedding() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-3-small".to_string(),
            "https://api.openai.com/v1".to_string(),
            std::env::var("OPENAI_API_KEY").ok(),
            Duration::from_secs(30),
        )
        .unwrap();

        let embedding = client.generate("Road closure detour procedure").await.unwrap();
        assert_eq!(embedding.len(), 1536);
    }
}
