//! Chat completion clients

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::CompletionRequest;
use super::LlmProvider;
use super::ResponseFormat;
use super::TextGenerator;
use crate::config::AppConfig;
use crate::errors::GuardianlyError;
use crate::errors::Result;

/// Remote chat model behind one provider
pub struct LlmService {
    provider: LlmProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service from the `[llm]` section
    ///
    /// # Errors
    /// - Unknown provider name
    /// - Missing API key for the openai provider
    pub fn new(config: &AppConfig) -> Result<Self> {
        let llm = &config.llm;
        let provider: LlmProvider = llm.provider.parse()?;
        let api_key = Some(llm.api_key.trim().to_string()).filter(|key| !key.is_empty());
        if provider == LlmProvider::OpenAI && api_key.is_none() {
            return Err(GuardianlyError::ConfigError(
                "llm.api_key (or GUARDIANLY_LLM_API_KEY / OPENAI_API_KEY) is required for the openai provider"
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| GuardianlyError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model: llm.model.clone(),
            endpoint: llm.endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_openai(&self, request: &CompletionRequest<'_>) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            temperature: f32,
            max_tokens: usize,
            messages: [ChatMessage<'a>; 2],
            #[serde(skip_serializing_if = "Option::is_none")]
            response_format: Option<OpenAIResponseFormat>,
        }

        #[derive(Serialize)]
        struct OpenAIResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GuardianlyError::ConfigError("OpenAI API key not provided".to_string()))?;

        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: messages(request),
            response_format: (request.response_format == ResponseFormat::Json)
                .then_some(OpenAIResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions: {} ({})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GuardianlyError::GenerationError(format!("request failed: {e}")))?;

        let text = read_body(response, "OpenAI").await?;
        parse_openai_completion(&text)
    }

    async fn complete_ollama(&self, request: &CompletionRequest<'_>) -> Result<String> {
        #[derive(Serialize)]
        struct OllamaChatRequest<'a> {
            model: &'a str,
            messages: [ChatMessage<'a>; 2],
            stream: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            format: Option<&'static str>,
            options: OllamaOptions,
        }

        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            num_predict: usize,
        }

        let body = OllamaChatRequest {
            model: &self.model,
            messages: messages(request),
            stream: false,
            format: (request.response_format == ResponseFormat::Json).then_some("json"),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat: {} ({})", url, self.model);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GuardianlyError::GenerationError(format!("request failed: {e}")))?;

        let text = read_body(response, "Ollama").await?;
        parse_ollama_completion(&text)
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(request).await,
            LlmProvider::Ollama => self.complete_ollama(request).await,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn messages<'a>(request: &CompletionRequest<'a>) -> [ChatMessage<'a>; 2] {
    [
        ChatMessage {
            role: "system",
            content: request.system,
        },
        ChatMessage {
            role: "user",
            content: request.user,
        },
    ]
}

async fn read_body(response: reqwest::Response, provider: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        return Err(GuardianlyError::GenerationError(format!(
            "{provider} returned {status}: {error_text}"
        )));
    }
    response
        .text()
        .await
        .map_err(|e| GuardianlyError::GenerationError(format!("Failed to read response: {e}")))
}

fn parse_openai_completion(body: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatChoice>,
    }

    #[derive(Deserialize)]
    struct ChatChoice {
        message: AssistantMessage,
    }

    #[derive(Deserialize)]
    struct AssistantMessage {
        #[serde(default)]
        content: Option<String>,
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GuardianlyError::GenerationError(format!("Failed to parse response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .ok_or_else(|| GuardianlyError::GenerationError("no completion in response".to_string()))
}

fn parse_ollama_completion(body: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct OllamaChatResponse {
        message: OllamaMessage,
    }

    #[derive(Deserialize)]
    struct OllamaMessage {
        content: String,
    }

    let parsed: OllamaChatResponse = serde_json::from_str(body)
        .map_err(|e| GuardianlyError::GenerationError(format!("Failed to parse response: {e}")))?;
    Ok(parsed.message.content)
}
