mod common;

use std::sync::Arc;

use ctcae_match::error::ReindexError;
use ctcae_match::reindex::{SourceFormat, load_blocks, reindex_and_persist, reindex_from_csv};
use ctcae_reference::catalog::ReferenceCatalog;
use ctcae_reference::error::ExtractionError;
use ctcae_search::flush::load_snapshot;
use ctcae_search::index::VectorIndex;
use ctcae_search::query::Retriever;

use common::{Harness, LONG_TABLE, ScriptedCompleter, selected, test_config, write_csv};

async fn top_grades(harness: &Harness) -> Vec<(String, f32)> {
    let vector = harness.embedder.vector("severe headache pain");
    Retriever::new(harness.index.clone())
        .search("ctcae_grades", &vector, 5, None)
        .await
        .unwrap()
        .into_iter()
        .map(|hit| (hit.record.source_id, hit.score))
        .collect()
}

#[tokio::test]
async fn bad_grade_label_leaves_previous_index_serving() {
    let harness = Harness::new().await;
    let before = top_grades(&harness).await;

    let broken = LONG_TABLE.replace("Grade 2,Moderate pain", "Grade 9,Moderate pain");
    let path = write_csv(harness.dir.path(), "broken.csv", &broken);
    let err = reindex_from_csv(
        &path,
        SourceFormat::Long,
        &harness.indexer,
        &test_config().index_target(),
    )
    .await
    .unwrap_err();

    match err {
        ReindexError::Extraction(ExtractionError::InvalidGradeLabel { term, label, .. }) => {
            assert_eq!(term, "Headache");
            assert_eq!(label, "Grade 9");
        }
        other => panic!("expected InvalidGradeLabel, got {other:?}"),
    }

    let info = harness.index.describe("ctcae_grades").await.unwrap().unwrap();
    assert_eq!(info.generation, harness.report.generation);
    assert_eq!(top_grades(&harness).await, before);
}

#[tokio::test]
async fn unchanged_source_rebuilds_to_identical_retrieval() {
    let harness = Harness::new().await;
    let before = top_grades(&harness).await;

    let path = write_csv(harness.dir.path(), "again.csv", LONG_TABLE);
    let report = reindex_from_csv(
        &path,
        SourceFormat::Long,
        &harness.indexer,
        &test_config().index_target(),
    )
    .await
    .unwrap();

    assert_ne!(report.generation, harness.report.generation);
    assert_eq!(top_grades(&harness).await, before);
}

const WIDE_TABLE: &str = "\
MedDRA Code,MedDRA SOC,CTCAE Term,Grade 1,Grade 2,Grade 3,Grade 4,Grade 5,Definition,Navigational Note
10019211,Nervous system disorders,Headache,Mild pain,Moderate pain; limiting instrumental ADL,Severe pain; limiting self care ADL,-,-,A disorder characterized by a sensation of marked discomfort in various parts of the head,
10028813,Gastrointestinal disorders,Nausea,Loss of appetite without alteration in eating habits,Oral intake decreased without significant weight loss,Inadequate oral caloric or fluid intake,-,-,A disorder characterized by a queasy sensation and/or the urge to vomit,
";

#[test]
fn wide_source_loads_the_same_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "wide.csv", WIDE_TABLE);

    let blocks = load_blocks(&path, SourceFormat::Wide).unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].term.term_id, "headache");
    assert_eq!(blocks[0].term.meddra_code.as_deref(), Some("10019211"));
    assert_eq!(blocks[0].grades.len(), 3);
    assert!(blocks.iter().all(|b| b.grades.iter().all(|g| g.term_id == b.term.term_id)));
}

#[test]
fn missing_source_file_is_an_extraction_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_blocks(&dir.path().join("absent.csv"), SourceFormat::Wide).unwrap_err();
    assert!(matches!(err, ReindexError::Extraction(ExtractionError::Io(_))));
}

#[tokio::test]
async fn persisted_snapshot_serves_a_new_engine() {
    let harness = Harness::new().await;
    let csv = write_csv(harness.dir.path(), "ctcae.csv", LONG_TABLE);
    let snapshot = harness.dir.path().join("index.json.zst");
    let catalog = harness.dir.path().join("catalog.json");

    let report = reindex_and_persist(
        &csv,
        SourceFormat::Long,
        &harness.indexer,
        &harness.index,
        &test_config().index_target(),
        &snapshot,
        Some(("5.0", catalog.as_path())),
    )
    .await
    .unwrap();

    let saved = ReferenceCatalog::load(&catalog).unwrap();
    assert_eq!(saved.version, "5.0");
    assert_eq!(saved.terms.len(), 3);

    let restored = Arc::new(load_snapshot(&snapshot).unwrap());
    let completer = Arc::new(ScriptedCompleter::new([selected("headache", "headache:3")]));
    let engine = ctcae_match::engine::MatchEngine::new(
        harness.embedder.clone(),
        completer,
        restored,
        test_config(),
    )
    .await
    .unwrap();

    let query = ctcae_core::models::matching::MatchQuery::new(
        "severe headache with nausea",
        Some("occurs daily, pain level 8/10".to_string()),
    )
    .unwrap();
    let result = engine.match_query(&query).await.unwrap();
    assert!(result.matched);
    assert_eq!(result.generation.as_deref(), Some(report.generation.as_str()));
}
