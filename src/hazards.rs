//! Canonical hazard vocabulary
//!
//! Every hazard the backend knows about is described by a single
//! [`HazardProfile`] row: its canonical key, display name, the filename
//! fragment that tags ingested playbooks, and the canned recommendation used
//! by the deterministic strategy. Request normalisation, ingestion tagging
//! and canned responses all read from [`HAZARD_PROFILES`].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::GuardianlyError;
use crate::models::Severity;

/// Provenance string attached to every recommendation authored by the system
pub const RECOMMENDATION_SOURCE: &str = "Guardianly AI Agent";

/// Normalized hazard category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    RoadClosure,
    SevereWeatherRain,
    /// Ingestion tag for playbooks that match no specific hazard
    General,
}

/// Canned recommendation text for one hazard
#[derive(Debug)]
pub struct CannedRecommendation {
    pub severity: Severity,
    pub message: &'static str,
    pub actions: &'static [&'static str],
    /// Prefix of an extra action that quotes the tail of the retrieved context
    pub context_action: Option<&'static str>,
}

/// One row of the canonical hazard table
#[derive(Debug)]
pub struct HazardProfile {
    pub category: HazardCategory,
    pub key: &'static str,
    pub display_name: &'static str,
    /// Fragment looked for in playbook filenames at ingestion time
    pub filename_pattern: Option<&'static str>,
    /// Whether clients may request this hazard
    pub requestable: bool,
    pub canned: CannedRecommendation,
}

pub static HAZARD_PROFILES: &[HazardProfile] = &[
    HazardProfile {
        category: HazardCategory::RoadClosure,
        key: "road_closure",
        display_name: "Road Closure",
        filename_pattern: Some("road_closure"),
        requestable: true,
        canned: CannedRecommendation {
            severity: Severity::High,
            message: "Immediate road closure detected. A guaranteed, safe detour route is calculated.",
            actions: &[
                "Immediately divert to the new Mapbox suggested route.",
                "Verify the entire route is clear after starting the detour.",
            ],
            context_action: Some(
                "Be aware of the nearest police station for assistance, as noted in context: ",
            ),
        },
    },
    HazardProfile {
        category: HazardCategory::SevereWeatherRain,
        key: "severe_weather_rain",
        display_name: "Severe Weather (Heavy Rain)",
        filename_pattern: Some("severe_weather"),
        requestable: true,
        canned: CannedRecommendation {
            severity: Severity::Moderate,
            message: "Severe rain is making travel hazardous. Please find a safe covered shelter to pause your trip.",
            actions: &[
                "Find and park at the nearest covered shelter (0.5 miles away).",
                "Wait for the weather alert to pass.",
                "If waiting is not possible, significantly reduce your speed and use hazard lights.",
            ],
            context_action: None,
        },
    },
    HazardProfile {
        category: HazardCategory::General,
        key: "general",
        display_name: "General Caution",
        filename_pattern: None,
        requestable: false,
        canned: CannedRecommendation {
            severity: Severity::Low,
            message: "Default caution alert triggered. No critical hazard detected.",
            actions: &[
                "Proceed with caution.",
                "Check local news for any further updates.",
            ],
            context_action: None,
        },
    },
];

/// Normalize raw client text onto the canonical key form:
/// trim, lowercase, spaces to underscores
pub fn normalize_hazard_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Display names of every hazard a client may request
pub fn allowed_display_names() -> Vec<&'static str> {
    HAZARD_PROFILES
        .iter()
        .filter(|profile| profile.requestable)
        .map(|profile| profile.display_name)
        .collect()
}

impl HazardCategory {
    /// Resolve raw client input against the requestable hazard set
    ///
    /// Accepts the normalized key or, case-insensitively, the display name.
    pub fn resolve(raw: &str) -> Result<Self, GuardianlyError> {
        let key = normalize_hazard_key(raw);
        let trimmed = raw.trim();
        HAZARD_PROFILES
            .iter()
            .filter(|profile| profile.requestable)
            .find(|profile| profile.key == key || profile.display_name.eq_ignore_ascii_case(trimmed))
            .map(|profile| profile.category)
            .ok_or_else(|| GuardianlyError::UnknownHazard(raw.to_string()))
    }

    /// Tag a playbook by its filename, defaulting to `General`
    pub fn detect_from_filename(filename: &str) -> Self {
        let normalized = normalize_hazard_key(filename);
        HAZARD_PROFILES
            .iter()
            .find(|profile| {
                profile
                    .filename_pattern
                    .is_some_and(|pattern| normalized.contains(pattern))
            })
            .map_or(Self::General, |profile| profile.category)
    }

    pub fn profile(self) -> &'static HazardProfile {
        HAZARD_PROFILES
            .iter()
            .find(|profile| profile.category == self)
            .unwrap_or(&HAZARD_PROFILES[HAZARD_PROFILES.len() - 1])
    }

    pub fn key(self) -> &'static str {
        self.profile().key
    }

    pub fn display_name(self) -> &'static str {
        self.profile().display_name
    }

    pub fn is_requestable(self) -> bool {
        self.profile().requestable
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HazardCategory {
    type Err = GuardianlyError;

    /// Parse any canonical key, including ingestion-only tags
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_hazard_key(s);
        HAZARD_PROFILES
            .iter()
            .find(|profile| profile.key == key)
            .map(|profile| profile.category)
            .ok_or_else(|| GuardianlyError::UnknownHazard(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hazard_key() {
        assert_eq!(normalize_hazard_key("  Road Closure "), "road_closure");
        assert_eq!(normalize_hazard_key("SEVERE WEATHER RAIN"), "severe_weather_rain");
    }

    #[test]
    fn test_resolve_requestable_hazards() {
        assert_eq!(
            HazardCategory::resolve("Road Closure").unwrap(),
            HazardCategory::RoadClosure
        );
        assert_eq!(
            HazardCategory::resolve("severe_weather_rain").unwrap(),
            HazardCategory::SevereWeatherRain
        );
    }

    #[test]
    fn test_resolve_accepts_display_names() {
        assert_eq!(
            HazardCategory::resolve("Severe Weather (Heavy Rain)").unwrap(),
            HazardCategory::SevereWeatherRain
        );
        assert_eq!(
            HazardCategory::resolve(" road closure ").unwrap(),
            HazardCategory::RoadClosure
        );
    }

    #[test]
    fn test_resolve_rejects_unknown_and_ingestion_only() {
        assert!(matches!(
            HazardCategory::resolve("earthquake"),
            Err(GuardianlyError::UnknownHazard(raw)) if raw == "earthquake"
        ));
        assert!(HazardCategory::resolve("general").is_err());
    }

    #[test]
    fn test_from_str_accepts_ingestion_tags() {
        assert_eq!("general".parse::<HazardCategory>().unwrap(), HazardCategory::General);
    }

    #[test]
    fn test_detect_from_filename() {
        assert_eq!(
            HazardCategory::detect_from_filename("mock_playbook_road_closure.txt"),
            HazardCategory::RoadClosure
        );
        assert_eq!(
            HazardCategory::detect_from_filename("mock_playbook_severe_weather.txt"),
            HazardCategory::SevereWeatherRain
        );
        assert_eq!(
            HazardCategory::detect_from_filename("mock_playbook_earthquake.txt"),
            HazardCategory::General
        );
    }

    #[test]
    fn test_allowed_display_names() {
        assert_eq!(
            allowed_display_names(),
            vec!["Road Closure", "Severe Weather (Heavy Rain)"]
        );
    }

    #[test]
    fn test_every_category_has_a_profile() {
        for category in [
            HazardCategory::RoadClosure,
            HazardCategory::SevereWeatherRain,
            HazardCategory::General,
        ] {
            assert_eq!(category.profile().category, category);
            assert!(!category.profile().canned.actions.is_empty());
        }
    }
}
