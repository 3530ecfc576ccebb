//! Request and recommendation schema validation
//!
//! Request validation collects every field problem before returning, so one
//! 400 response can list them all. Recommendation validation is the gate every
//! model output passes through before it reaches a client.

use serde_json::Map;
use serde_json::Value;

use crate::errors::GuardianlyError;
use crate::errors::ValidationErrors;
use crate::models::HazardQuery;
use crate::models::Recommendation;
use crate::models::Severity;

pub const MISSING_FIELD: &str = "Missing data for required field.";
pub const BLANK_FIELD: &str = "Field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_A_NUMBER: &str = "Not a valid number.";
pub const NOT_A_LIST: &str = "Not a valid list.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";
pub const INVALID_INPUT: &str = "Invalid input type.";

/// Key used for errors that concern the whole body rather than one field
pub const SCHEMA_KEY: &str = "_schema";

const RECOMMENDATION_FIELDS: [&str; 4] = ["severity", "message", "actions", "source"];

/// Upper bound on recommended actions
pub const MAX_ACTIONS: usize = 3;

/// Validate a raw generate-recommendation request body
pub fn validate_request(raw: &Value) -> Result<HazardQuery, GuardianlyError> {
    let mut errors = ValidationErrors::new();

    let Some(body) = raw.as_object() else {
        errors.add(SCHEMA_KEY, INVALID_INPUT);
        return Err(GuardianlyError::RequestValidation(errors));
    };

    let hazard = required_string(body, "hazard", &mut errors);
    let user_lat = required_coordinate(body, "user_lat", 90.0, &mut errors);
    let user_lng = required_coordinate(body, "user_lng", 180.0, &mut errors);

    match (hazard, user_lat, user_lng) {
        (Some(hazard_type), Some(user_lat), Some(user_lng)) if errors.is_empty() => {
            Ok(HazardQuery {
                hazard_type,
                user_lat,
                user_lng,
            })
        }
        _ => Err(GuardianlyError::RequestValidation(errors)),
    }
}

/// Validate untrusted recommendation JSON, typically raw model output
pub fn validate_recommendation(raw: &Value) -> Result<Recommendation, GuardianlyError> {
    let mut errors = ValidationErrors::new();

    let Some(body) = raw.as_object() else {
        errors.add(SCHEMA_KEY, INVALID_INPUT);
        return Err(GuardianlyError::Schema(errors));
    };

    for field in body.keys() {
        if !RECOMMENDATION_FIELDS.contains(&field.as_str()) {
            errors.add(field.clone(), UNKNOWN_FIELD);
        }
    }

    let severity = match body.get("severity") {
        None | Some(Value::Null) => {
            errors.add("severity", MISSING_FIELD);
            None
        }
        Some(Value::String(value)) => {
            let parsed = Severity::parse_canonical(value);
            if parsed.is_none() {
                errors.add("severity", "Must be one of: High, Moderate, Low.");
            }
            parsed
        }
        Some(_) => {
            errors.add("severity", NOT_A_STRING);
            None
        }
    };

    let message = required_string(body, "message", &mut errors);
    let source = required_string(body, "source", &mut errors);
    let actions = required_actions(body, &mut errors);

    match (severity, message, actions, source) {
        (Some(severity), Some(message), Some(actions), Some(source)) if errors.is_empty() => {
            Ok(Recommendation {
                severity,
                message,
                actions,
                source,
            })
        }
        _ => Err(GuardianlyError::Schema(errors)),
    }
}

/// Check a typed recommendation against the same rules as raw output
pub fn check_recommendation(recommendation: &Recommendation) -> Result<(), GuardianlyError> {
    let value = serde_json::to_value(recommendation)?;
    validate_recommendation(&value).map(|_| ())
}

fn required_string(
    body: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, MISSING_FIELD);
            None
        }
        Some(Value::String(value)) if value.trim().is_empty() => {
            errors.add(field, BLANK_FIELD);
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(_) => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

fn required_coordinate(
    body: &Map<String, Value>,
    field: &str,
    bound: f64,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let number = match body.get(field) {
        None | Some(Value::Null) => {
            errors.add(field, MISSING_FIELD);
            return None;
        }
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match number {
        Some(value) if value.is_finite() => {
            if (-bound..=bound).contains(&value) {
                Some(value)
            } else {
                errors.add(
                    field,
                    format!(
                        "Must be greater than or equal to {} and less than or equal to {bound}.",
                        -bound
                    ),
                );
                None
            }
        }
        _ => {
            errors.add(field, NOT_A_NUMBER);
            None
        }
    }
}

fn required_actions(body: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<Vec<String>> {
    let items = match body.get("actions") {
        None | Some(Value::Null) => {
            errors.add("actions", MISSING_FIELD);
            return None;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.add("actions", NOT_A_LIST);
            return None;
        }
    };

    if items.is_empty() {
        errors.add("actions", "Must contain at least one action.");
        return None;
    }
    if items.len() > MAX_ACTIONS {
        errors.add("actions", format!("Must contain at most {MAX_ACTIONS} actions."));
        return None;
    }

    let mut actions = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item {
            Value::String(text) if !text.trim().is_empty() => actions.push(text.clone()),
            Value::String(_) => errors.add("actions", format!("Item {idx}: {BLANK_FIELD}")),
            _ => errors.add("actions", format!("Item {idx}: {NOT_A_STRING}")),
        }
    }

    (actions.len() == items.len()).then_some(actions)
}
