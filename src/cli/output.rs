//! CLI output formatting utilities

use crate::hazards::HAZARD_PROFILES;
use crate::models::IngestReport;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the original string, or the first `max_chars` characters
/// followed by "..." when it is longer.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Show only the last four characters of a secret
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "****".to_string(),
        n => format!("****{}", chars[n - 4..].iter().collect::<String>()),
    }
}

pub fn print_config(config: &AppConfig) {
    println!("📋 Guardianly Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🔢 Embeddings:");
    println!("  Provider: {}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  API key: {}", mask_secret(&config.embeddings.api_key));
    println!();

    println!("🗂️  Vector index:");
    println!("  Backend: {}", config.vector_index.backend);
    println!("  Index: {}", config.index_name());
    println!(
        "  Host: {}",
        config.vector_index.host.as_deref().unwrap_or("(resolved at runtime)")
    );
    println!(
        "  Serverless: {}/{}",
        config.vector_index.cloud, config.vector_index.region
    );
    println!("  API key: {}", mask_secret(&config.vector_index.api_key));
    println!();

    println!("🤖 Generation:");
    println!("  Strategy: {:?}", config.generation_strategy());
    println!("  LLM: {} {}", config.llm.provider, config.llm_model());
    println!("  Temperature: {}", config.llm.temperature);
    println!("  API key: {}", mask_secret(&config.llm.api_key));
    println!();

    println!("🔍 Retrieval:");
    println!("  Top K: {}", config.top_k());
    println!("  Timeout: {}s", config.retrieval.timeout_secs);
    println!(
        "  Embedding cache TTL: {}s",
        config.retrieval.embedding_cache_ttl_secs
    );
    println!();

    println!("🌐 Server:");
    println!("  Bind: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.cors);
}

pub fn print_hazards() {
    println!("Canonical hazards:");
    for profile in HAZARD_PROFILES {
        println!(
            "  - {:<22} {:<30} severity: {:<8} {}",
            profile.key,
            profile.display_name,
            profile.canned.severity.as_str(),
            if profile.requestable {
                ""
            } else {
                "(ingestion tag only)"
            }
        );
    }
}

pub fn print_ingest_report(report: &IngestReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "📚 Ingested into {} in {}ms{}",
        report.index_name,
        elapsed.num_milliseconds(),
        if report.index_created {
            " (index created)"
        } else {
            ""
        }
    );
    if let Some(error) = &report.index_error {
        print_warning(&format!("Index setup failed: {}", truncate_str(error, 200)));
    }
    for id in &report.indexed {
        print_success(&format!("Indexed: {id}"));
    }
    for failure in &report.failed {
        print_error(&format!(
            "{} ({:?}): {}",
            failure.id,
            failure.stage,
            truncate_str(&failure.error, 200)
        ));
    }
    println!(
        "Total: {} | indexed: {} | failed: {}",
        report.total(),
        report.indexed.len(),
        report.failed.len()
    );
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}
