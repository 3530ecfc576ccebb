//! Context assembly from index matches

use crate::models::IndexMatch;
use crate::models::RetrievedContext;

/// Delimiter placed between matched playbook texts
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Joins match texts in index order, no re-ranking
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    separator: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(CONTEXT_SEPARATOR)
    }
}

impl ContextAssembler {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Matches without metadata text are skipped; nothing usable is `NoMatches`
    #[must_use]
    pub fn assemble(&self, matches: &[IndexMatch]) -> RetrievedContext {
        let texts: Vec<&str> = matches
            .iter()
            .filter_map(|m| m.metadata.as_ref())
            .map(|metadata| metadata.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .collect();

        if texts.is_empty() {
            RetrievedContext::NoMatches
        } else {
            RetrievedContext::Grounded(texts.join(&self.separator))
        }
    }
}
