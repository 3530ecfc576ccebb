//! One-off recommendation handler

use serde_json::json;

use crate::cli::output::print_error;
use crate::services::AppServices;
use crate::AppConfig;
use crate::GuardianlyError;
use crate::Result;

/// Run one request through the same path as the HTTP endpoint and print the body
pub async fn handle_recommend(config: &AppConfig, hazard: String, lat: f64, lng: f64) -> Result<()> {
    let services = AppServices::from_config(config)?;

    let body = json!({
        "hazard": hazard,
        "user_lat": lat,
        "user_lng": lng,
    });
    let raw = serde_json::to_vec(&body)?;
    let (status, response) = services
        .recommendations
        .handle_generate_recommendation(&raw)
        .await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if status.is_success() {
        Ok(())
    } else {
        print_error(&format!("Request rejected ({status})"));
        Err(GuardianlyError::Custom(format!(
            "recommendation request failed with {status}"
        )))
    }
}
