//! Text preprocessing utilities for embedding generation
//!
//! Playbooks arrive as hand-edited text files: mixed newlines, tabs and the
//! occasional stray control character. Everything is flattened to single
//! spaces before it is sent to the embedding service.

use tracing::debug;
use tracing::warn;

use crate::errors::GuardianlyError;

/// Character budget per embedding request, well under the 8k-token model limit
pub const MAX_EMBEDDING_CHARS: usize = 24_000;

/// Preprocess text for embedding generation
pub fn preprocess_text_for_embedding(text: &str) -> Result<String, GuardianlyError> {
    preprocess_with_budget(text, MAX_EMBEDDING_CHARS)
}

pub fn preprocess_with_budget(text: &str, max_chars: usize) -> Result<String, GuardianlyError> {
    if text.is_empty() {
        return Err(GuardianlyError::EmbeddingError(
            "Empty text provided".to_string(),
        ));
    }

    let sanitized = sanitize_text(&normalize_whitespace(text));

    if sanitized.is_empty() {
        return Err(GuardianlyError::EmbeddingError(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    let char_count = sanitized.chars().count();
    if char_count > max_chars {
        warn!("Text too long ({char_count} chars), truncating to {max_chars}");
        return Ok(smart_truncate_text(&sanitized, max_chars));
    }

    debug!("Preprocessed text: {} -> {} chars", text.len(), sanitized.len());
    Ok(sanitized)
}

/// Normalize whitespace and newlines
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Replace control characters with spaces and collapse the result
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Truncate at a word boundary near the budget, never inside a character
fn smart_truncate_text(text: &str, max_chars: usize) -> String {
    let Some((byte_end, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let truncated = &text[..byte_end];
    if let Some(last_space) = truncated.rfind(' ') {
        // Only use the word boundary if it's not too far back
        if last_space > byte_end * 3 / 4 {
            return truncated[..last_space].to_string();
        }
    }

    truncated.to_string()
}
