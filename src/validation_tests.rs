//! Unit tests for request and recommendation validation

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::errors::GuardianlyError;
    use crate::errors::ValidationErrors;
    use crate::models::Recommendation;
    use crate::models::Severity;
    use crate::validation::*;

    fn request_errors(raw: &serde_json::Value) -> ValidationErrors {
        match validate_request(raw) {
            Err(GuardianlyError::RequestValidation(errors)) => errors,
            other => panic!("expected request validation error, got {other:?}"),
        }
    }

    fn schema_errors(raw: &serde_json::Value) -> ValidationErrors {
        match validate_recommendation(raw) {
            Err(GuardianlyError::Schema(errors)) => errors,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    // ====== Request Validation Tests ======

    #[test]
    fn test_valid_request() {
        let query = validate_request(&json!({
            "hazard": "Road Closure",
            "user_lat": 44.95,
            "user_lng": -123.03
        }))
        .unwrap();

        assert_eq!(query.hazard_type, "Road Closure");
        assert!((query.user_lat - 44.95).abs() < f64::EPSILON);
        assert!((query.user_lng + 123.03).abs() < f64::EPSILON);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let query = validate_request(&json!({
            "hazard": "road_closure",
            "user_lat": "10.5",
            "user_lng": "-20"
        }))
        .unwrap();
        assert!((query.user_lat - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_latitude_out_of_range_names_field() {
        let errors = request_errors(&json!({
            "hazard": "Road Closure",
            "user_lat": 95,
            "user_lng": 0
        }));
        assert!(errors.contains("user_lat"));
        assert_eq!(errors.len(), 1);
        assert!(errors.get("user_lat").unwrap()[0].contains("90"));
    }

    #[test]
    fn test_longitude_bounds_inclusive() {
        assert!(validate_request(&json!({"hazard": "x", "user_lat": -90, "user_lng": 180})).is_ok());
        let errors = request_errors(&json!({"hazard": "x", "user_lat": 0, "user_lng": -180.5}));
        assert!(errors.contains("user_lng"));
    }

    #[test]
    fn test_blank_hazard_names_field() {
        let errors = request_errors(&json!({
            "hazard": "",
            "user_lat": 44.95,
            "user_lng": -123.03
        }));
        assert_eq!(errors.get("hazard").unwrap(), [BLANK_FIELD.to_string()]);
    }

    #[test]
    fn test_errors_collected_across_fields() {
        let errors = request_errors(&json!({
            "hazard": 12,
            "user_lat": true
        }));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["hazard", "user_lat", "user_lng"]);
        assert_eq!(errors.get("hazard").unwrap()[0], NOT_A_STRING);
        assert_eq!(errors.get("user_lat").unwrap()[0], NOT_A_NUMBER);
        assert_eq!(errors.get("user_lng").unwrap()[0], MISSING_FIELD);
    }

    #[test]
    fn test_non_object_body() {
        let errors = request_errors(&json!(["hazard"]));
        assert!(errors.contains(SCHEMA_KEY));
    }

    // ====== Recommendation Validation Tests ======

    #[test]
    fn test_valid_recommendation() {
        let recommendation = validate_recommendation(&json!({
            "severity": "Moderate",
            "message": "Heavy rain ahead.",
            "actions": ["Slow down", "Find shelter"],
            "source": "Guardianly AI Agent"
        }))
        .unwrap();
        assert_eq!(recommendation.severity, Severity::Moderate);
        assert_eq!(recommendation.actions.len(), 2);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let errors = schema_errors(&json!({
            "severity": "Unknown",
            "message": "m",
            "actions": ["a"],
            "source": "s"
        }));
        assert!(errors.contains("severity"));
    }

    #[test]
    fn test_empty_and_blank_actions_rejected() {
        let errors = schema_errors(&json!({
            "severity": "Low",
            "message": "m",
            "actions": [],
            "source": "s"
        }));
        assert!(errors.contains("actions"));

        let errors = schema_errors(&json!({
            "severity": "Low",
            "message": "m",
            "actions": ["ok", "  ", 3],
            "source": "s"
        }));
        assert_eq!(errors.get("actions").unwrap().len(), 2);
    }

    #[test]
    fn test_too_many_actions_rejected() {
        let errors = schema_errors(&json!({
            "severity": "High",
            "message": "m",
            "actions": ["a", "b", "c", "d", "e", "f"],
            "source": "s"
        }));
        assert_eq!(errors.get("actions").unwrap()[0], "Must contain at most 3 actions.");

        assert!(validate_recommendation(&json!({
            "severity": "High",
            "message": "m",
            "actions": ["a", "b", "c"],
            "source": "s"
        }))
        .is_ok());
    }

    #[test]
    fn test_extra_fields_rejected() {
        let errors = schema_errors(&json!({
            "severity": "High",
            "message": "m",
            "actions": ["a"],
            "source": "s",
            "confidence": 0.9
        }));
        assert_eq!(errors.get("confidence").unwrap()[0], UNKNOWN_FIELD);
    }

    #[test]
    fn test_missing_message_and_source() {
        let errors = schema_errors(&json!({"severity": "High", "actions": ["a"]}));
        assert!(errors.contains("message"));
        assert!(errors.contains("source"));
    }

    #[test]
    fn test_check_recommendation_rejects_unknown_severity() {
        let recommendation = Recommendation {
            severity: Severity::Unknown,
            message: "m".to_string(),
            actions: vec!["a".to_string()],
            source: "s".to_string(),
        };
        assert!(check_recommendation(&recommendation).is_err());
    }
}
