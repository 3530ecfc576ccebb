//! Text generation backends
//!
//! The model-backed recommendation strategy talks to a chat model through
//! [`TextGenerator`]. [`LlmService`] implements it for OpenAI-compatible chat
//! completions and for Ollama; tests inject scripted generators.

pub mod client;
pub mod prompts;

use std::str::FromStr;

use async_trait::async_trait;
pub use client::LlmService;
pub use prompts::PromptTemplate;
pub use prompts::RecommendationPrompts;

use crate::errors::GuardianlyError;
use crate::errors::Result;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = GuardianlyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(GuardianlyError::ConfigError(format!(
                "unknown llm provider '{other}' (expected openai or ollama)"
            ))),
        }
    }
}

/// Output constraint requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Provider-enforced JSON object output
    Json,
    Text,
}

/// A single system + user exchange
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: usize,
    pub response_format: ResponseFormat,
}

/// Produces raw model text for a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!(matches!(
            "anthropic".parse::<LlmProvider>(),
            Err(GuardianlyError::ConfigError(_))
        ));
    }
}
