//! Playbook loader tests against the in-memory index

mod common;

use std::sync::Arc;

use common::*;
use guardianly::ingest::content_id;
use guardianly::ingest::discover_playbooks;
use guardianly::ingest::PlaybookLoader;
use guardianly::models::IngestStage;
use guardianly::models::SourceDocument;
use guardianly::vector_index::InMemoryIndex;
use guardianly::vector_index::IndexSpec;
use guardianly::vector_index::VectorIndex;
use guardianly::Result;

fn loader(embedder: Arc<FixedEmbedder>, index: Arc<dyn VectorIndex>) -> PlaybookLoader {
    PlaybookLoader::new(embedder, index, IndexSpec::cosine("guardianly-playbooks", DIM), 4)
}

#[tokio::test]
async fn test_ingest_tags_and_stores_metadata() {
    let index = Arc::new(InMemoryIndex::new());
    let loader = loader(FixedEmbedder::new(), index.clone());

    let report = loader
        .ingest(vec![
            SourceDocument::new("mock_playbook_road_closure.txt", "Detour via Main St."),
            SourceDocument::new("mock_playbook_severe_weather.txt", "Find shelter."),
            SourceDocument::new("mock_playbook_wildfire.txt", "Evacuate north."),
        ])
        .await;

    assert!(report.index_created);
    assert!(report.is_complete_success());
    assert_eq!(report.indexed.len(), 3);
    assert!(report.finished_at >= report.started_at);

    let road = index.get("mock_playbook_road_closure.txt").unwrap();
    assert_eq!(road.values.len(), DIM);
    assert_eq!(road.metadata.text, "Detour via Main St.");
    assert_eq!(road.metadata.hazard, "road_closure");
    assert_eq!(road.metadata.source, "mock_playbook_road_closure.txt");

    let rain = index.get("mock_playbook_severe_weather.txt").unwrap();
    assert_eq!(rain.metadata.hazard, "severe_weather_rain");

    let other = index.get("mock_playbook_wildfire.txt").unwrap();
    assert_eq!(other.metadata.hazard, "general");
}

#[tokio::test]
async fn test_reingest_is_idempotent_and_last_write_wins() {
    let index = Arc::new(InMemoryIndex::new());
    let loader = loader(FixedEmbedder::new(), index.clone());

    let first = loader
        .ingest(vec![SourceDocument::new("mock_playbook_road_closure.txt", "Old text.")])
        .await;
    let second = loader
        .ingest(vec![SourceDocument::new("mock_playbook_road_closure.txt", "New text.")])
        .await;

    assert!(first.index_created);
    assert!(!second.index_created);
    assert!(second.is_complete_success());
    assert_eq!(index.len(), 1);
    assert_eq!(
        index.get("mock_playbook_road_closure.txt").unwrap().metadata.text,
        "New text."
    );
}

#[tokio::test]
async fn test_duplicate_ids_in_one_batch_keep_the_later_document() {
    let index = Arc::new(InMemoryIndex::new());
    let loader = loader(FixedEmbedder::new(), index.clone());

    loader
        .ingest(vec![
            SourceDocument::new("a.txt", "first"),
            SourceDocument::new("a.txt", "second"),
        ])
        .await;

    assert_eq!(index.len(), 1);
    assert_eq!(index.get("a.txt").unwrap().metadata.text, "second");
}

#[tokio::test]
async fn test_partial_failure_continues_batch() {
    let index = Arc::new(InMemoryIndex::new());
    let loader = loader(FixedEmbedder::failing_on("POISON"), index.clone());

    let report = loader
        .ingest(vec![
            SourceDocument::new("mock_playbook_road_closure.txt", "Detour."),
            SourceDocument::new("mock_playbook_bad.txt", "POISON"),
            SourceDocument::new("mock_playbook_severe_weather.txt", "Shelter."),
        ])
        .await;

    assert_eq!(
        report.indexed,
        vec!["mock_playbook_road_closure.txt", "mock_playbook_severe_weather.txt"]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "mock_playbook_bad.txt");
    assert_eq!(report.failed[0].stage, IngestStage::Embedding);
    assert!(!report.is_complete_success());
    assert_eq!(index.len(), 2);
    assert!(index.get("mock_playbook_bad.txt").is_none());
}

#[tokio::test]
async fn test_index_unavailable_is_recorded_per_document() {
    let loader = loader(FixedEmbedder::new(), Arc::new(FailingIndex));

    let report = loader
        .ingest(vec![
            SourceDocument::new("a.txt", "one"),
            SourceDocument::new("b.txt", "two"),
        ])
        .await;

    assert!(report.index_error.is_some());
    assert!(report.indexed.is_empty());
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|failure| failure.stage == IngestStage::Upsert));
    assert_eq!(report.total(), 2);
}

#[tokio::test]
async fn test_documents_without_filename_use_content_hash() {
    let index = Arc::new(InMemoryIndex::new());
    let loader = loader(FixedEmbedder::new(), index.clone());

    let report = loader
        .ingest(vec![SourceDocument {
            filename: None,
            text: "Unlabelled procedure.".to_string(),
        }])
        .await;

    let id = content_id("Unlabelled procedure.");
    assert_eq!(report.indexed, vec![id.clone()]);
    assert_eq!(index.get(&id).unwrap().metadata.hazard, "general");
}

#[tokio::test]
async fn test_discover_and_ingest_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("mock_playbook_road_closure.txt"),
        "Road closures require detours.",
    )?;
    std::fs::write(
        dir.path().join("mock_playbook_severe_weather.txt"),
        "Pull over in heavy rain.",
    )?;
    std::fs::write(dir.path().join("notes.txt"), "not a playbook")?;

    let documents = discover_playbooks(dir.path(), "mock_playbook_*.txt")?;
    assert_eq!(documents.len(), 2);

    let index = Arc::new(InMemoryIndex::new());
    let report = loader(FixedEmbedder::new(), index.clone())
        .ingest(documents)
        .await;

    assert_eq!(report.indexed.len(), 2);
    assert_eq!(index.len(), 2);
    Ok(())
}
