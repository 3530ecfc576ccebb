//! Prompt templates for recommendation generation

use std::collections::HashMap;

/// Template with `{{variable}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template; unknown placeholders are left as-is
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var.as_str()) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() && !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
        rest = &after[end + 2..];
    }

    variables
}

/// Prompts for the model-backed recommendation strategy
pub struct RecommendationPrompts;

impl RecommendationPrompts {
    /// System prompt pinning the output to the recommendation schema
    #[must_use]
    pub fn system() -> &'static str {
        r#"You are Guardianly, a road safety assistant for drivers.
You write short, concrete safety recommendations grounded in the provided procedure context.

Respond with a single JSON object with exactly these four fields and nothing else:
{
  "severity": one of "High", "Moderate", "Low",
  "message": one or two sentences for the driver,
  "actions": a non-empty list of short imperative steps,
  "source": "Guardianly AI Agent"
}

Do not add any other fields. Do not wrap the JSON in markdown.
If the context says no playbook was found or retrieval failed, give conservative general advice."#
    }

    /// User message carrying the hazard, location and retrieved context
    #[must_use]
    pub fn hazard_alert() -> PromptTemplate {
        PromptTemplate::new(
            r"Hazard: {{hazard}}
Driver location: {{lat}}, {{lng}}

Procedure context:
{{context}}

Write the safety recommendation for this driver.",
        )
    }
}
