//! Playbook ingestion handler

use std::path::Path;

use crate::cli::output::print_info;
use crate::cli::output::print_ingest_report;
use crate::cli::output::print_warning;
use crate::ingest::discover_playbooks;
use crate::services::AppServices;
use crate::AppConfig;
use crate::GuardianlyError;
use crate::Result;

pub async fn handle_ingest(
    config: &AppConfig,
    dir: &Path,
    pattern: Option<String>,
    json: bool,
) -> Result<()> {
    let pattern = pattern.unwrap_or_else(|| config.ingest.playbook_pattern.clone());
    let documents = discover_playbooks(dir, &pattern)?;

    if documents.is_empty() {
        print_warning(&format!(
            "No playbooks matching {pattern} found in {}",
            dir.display()
        ));
        return Ok(());
    }
    if !json {
        print_info(&format!("Found {} playbooks to ingest.", documents.len()));
    }

    let services = AppServices::from_config(config)?;
    let report = services.loader.ingest(documents).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_ingest_report(&report);
    }

    if report.indexed.is_empty() {
        return Err(GuardianlyError::Custom(
            "no playbooks were indexed".to_string(),
        ));
    }
    Ok(())
}
