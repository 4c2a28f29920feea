//! Edge-case tests: missing, empty, malformed and inconsistent inputs; failing collaborators.

use govaudit::analyzer::nlp::DisabledTextAnalyzer;
use govaudit::analyzer::EvaluationEngine;
use govaudit::evaluation::EvaluationStatus;
use govaudit::extraction::{
    ExtractedContent, FileExtractionProvider, ImageInfo, MemoryExtractionProvider,
};
use govaudit::fakes::{
    sample_analysis, sample_extraction, FailingExtractionProvider, FailingStore, SlowTextAnalyzer,
};
use govaudit::store::{EvaluationStore, MemoryStore};
use govaudit::CriterionStatus;
use std::sync::Arc;
use std::time::Duration;

const EXTRACTIONS: &str = "tests/fixtures/extractions";

fn file_engine(store: Arc<MemoryStore>) -> EvaluationEngine {
    EvaluationEngine::new(
        Arc::new(FileExtractionProvider::new(EXTRACTIONS)),
        Arc::new(DisabledTextAnalyzer),
        store,
    )
}

#[tokio::test]
async fn missing_extraction_fails_without_persisting() {
    let store = Arc::new(MemoryStore::new());
    let summary = file_engine(store.clone()).evaluate(999).await;

    assert_eq!(summary.status, EvaluationStatus::Failed);
    assert_eq!(summary.error.as_deref(), Some("missing prerequisite data"));
    assert!(!summary.persisted);
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_extraction_completes_with_mostly_na() {
    let store = Arc::new(MemoryStore::new());
    let engine = file_engine(store.clone());
    let summary = engine.evaluate(3).await;

    assert!(summary.is_completed(), "error: {:?}", summary.error);
    assert!(summary.counts.na > summary.counts.total() / 2);
    let evaluation = engine
        .get_result(&summary.evaluation_id)
        .await
        .unwrap()
        .unwrap();
    // no text corpus: the text criteria are not applicable and no source is recorded
    assert!(evaluation.nlp.is_none());
    assert_eq!(evaluation.criterion("ACC-12").unwrap().status, CriterionStatus::Na);
    // an absent url is not applicable, not a defect
    let domain = evaluation.criterion("SOB-01").unwrap();
    assert_eq!(domain.status, CriterionStatus::Na);
    assert!(domain.defect().is_none());
}

#[tokio::test]
async fn malformed_extraction_persists_failure_marker() {
    let store = Arc::new(MemoryStore::new());
    let summary = file_engine(store.clone()).evaluate(4).await;

    assert_eq!(summary.status, EvaluationStatus::Failed);
    assert!(summary.persisted);
    let stored = store.get(&summary.evaluation_id).await.unwrap().unwrap();
    assert_eq!(stored.status, EvaluationStatus::Failed);
    assert!(stored.criteria.is_empty());
    assert!(stored.error.is_some());
}

#[tokio::test]
async fn provider_backend_error_fails_run() {
    let store = Arc::new(MemoryStore::new());
    let engine = EvaluationEngine::new(
        Arc::new(FailingExtractionProvider::new()),
        Arc::new(DisabledTextAnalyzer),
        store.clone(),
    );
    let summary = engine.evaluate(1).await;

    assert_eq!(summary.status, EvaluationStatus::Failed);
    assert!(summary.error.unwrap().contains("permission denied"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn store_failure_reports_failed_summary() {
    let provider = MemoryExtractionProvider::new().with_site(5, sample_extraction());
    let engine = EvaluationEngine::new(
        Arc::new(provider),
        Arc::new(DisabledTextAnalyzer),
        Arc::new(FailingStore::new("disk full")),
    );
    let summary = engine.evaluate(5).await;

    assert_eq!(summary.status, EvaluationStatus::Failed);
    assert!(!summary.persisted);
    assert!(summary.error.unwrap().contains("disk full"));
    assert!(summary.grade.is_none());
}

#[tokio::test]
async fn inconsistent_counts_become_na_with_error_note() {
    let mut content = sample_extraction();
    content.images = Some(ImageInfo {
        total: 2,
        with_alt: 5,
        decorative: 0,
    });
    let store = Arc::new(MemoryStore::new());
    let engine = EvaluationEngine::new(
        Arc::new(MemoryExtractionProvider::new().with_site(6, content)),
        Arc::new(DisabledTextAnalyzer),
        store.clone(),
    );
    let summary = engine.evaluate(6).await;
    assert!(summary.is_completed());

    let evaluation = store.get(&summary.evaluation_id).await.unwrap().unwrap();
    let alt = evaluation.criterion("ACC-01").unwrap();
    assert_eq!(alt.status, CriterionStatus::Na);
    assert_eq!(alt.score, 0.0);
    assert!(alt.defect().unwrap().contains("inconsistent data"));
}

#[tokio::test]
async fn overflowing_heading_counts_only_affect_their_criterion() {
    let content: ExtractedContent = serde_json::from_str(
        r#"{"headings": {"h1_count": 18446744073709551615, "h2_count": 1}}"#,
    )
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = EvaluationEngine::new(
        Arc::new(MemoryExtractionProvider::new().with_site(8, content)),
        Arc::new(DisabledTextAnalyzer),
        store.clone(),
    );
    let summary = engine.evaluate(8).await;
    assert!(summary.is_completed(), "error: {:?}", summary.error);

    let evaluation = store.get(&summary.evaluation_id).await.unwrap().unwrap();
    let hierarchy = evaluation.criterion("ACC-06").unwrap();
    assert_eq!(hierarchy.status, CriterionStatus::Na);
    assert!(hierarchy.defect().unwrap().contains("overflow"));
    assert_eq!(evaluation.criteria.len(), 38);
}

#[tokio::test(start_paused = true)]
async fn slow_text_analysis_times_out_to_heuristics() {
    let store = Arc::new(MemoryStore::new());
    let engine = EvaluationEngine::new(
        Arc::new(MemoryExtractionProvider::new().with_site(7, sample_extraction())),
        Arc::new(SlowTextAnalyzer::new(Duration::from_secs(60), sample_analysis())),
        store.clone(),
    )
    .with_nlp_timeout(Duration::from_millis(500));
    let summary = engine.evaluate(7).await;
    assert!(summary.is_completed());

    let evaluation = store.get(&summary.evaluation_id).await.unwrap().unwrap();
    let nlp = evaluation.nlp.unwrap();
    assert_eq!(nlp.source.as_str(), "heuristic");
    assert!(nlp.fallback_reason.unwrap().contains("timed out after 500ms"));
}

#[tokio::test]
async fn empty_batch_returns_nothing() {
    let store = Arc::new(MemoryStore::new());
    assert!(file_engine(store).evaluate_many(&[]).await.is_empty());
}

#[test]
fn unknown_fields_are_ignored() {
    let content: ExtractedContent = serde_json::from_str(
        r#"{ "url": "https://www.sin.gob.bo/", "crawler_version": "3.1", "metadata": { "title": "SIN", "og_image": "x" } }"#,
    )
    .unwrap();
    assert_eq!(content.host().as_deref(), Some("www.sin.gob.bo"));
}
