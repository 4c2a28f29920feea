//! Integration tests: full evaluation pipeline against tests/fixtures/extractions/

use govaudit::analyzer::criteria::catalog;
use govaudit::analyzer::nlp::{DisabledTextAnalyzer, TextAnalyzer};
use govaudit::analyzer::EvaluationEngine;
use govaudit::evaluation::EvaluationStatus;
use govaudit::extraction::FileExtractionProvider;
use govaudit::fakes::{sample_analysis, StaticTextAnalyzer};
use govaudit::store::{EvaluationStore, JsonFileStore, MemoryStore};
use govaudit::{CriterionStatus, Dimension, Grade};
use std::sync::Arc;

const EXTRACTIONS: &str = "tests/fixtures/extractions";
const COMPLIANT_SITE: u64 = 1;
const POOR_SITE: u64 = 2;
const EMPTY_SITE: u64 = 3;

fn engine_with(analyzer: Arc<dyn TextAnalyzer>, store: Arc<dyn EvaluationStore>) -> EvaluationEngine {
    EvaluationEngine::new(
        Arc::new(FileExtractionProvider::new(EXTRACTIONS)),
        analyzer,
        store,
    )
}

fn offline_engine(store: Arc<dyn EvaluationStore>) -> EvaluationEngine {
    engine_with(Arc::new(DisabledTextAnalyzer), store)
}

// --- Score sanity tests ---

#[tokio::test]
async fn compliant_site_scores_b_or_above() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(COMPLIANT_SITE).await;

    assert!(summary.is_completed(), "error: {:?}", summary.error);
    assert!(
        summary.total_score >= 85.0,
        "compliant site = {:.1} ({:?})",
        summary.total_score,
        summary.grade
    );
    assert!(matches!(summary.grade, Some(Grade::A) | Some(Grade::B)));
    assert_eq!(summary.counts.failed, 0);
}

#[tokio::test]
async fn poor_site_scores_f() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(POOR_SITE).await;

    assert!(summary.is_completed());
    assert!(summary.total_score < 40.0, "poor site = {:.1}", summary.total_score);
    assert_eq!(summary.grade, Some(Grade::F));
    assert!(summary.counts.failed > 10);
}

#[tokio::test]
async fn poor_site_reports_expected_violations() {
    let store = Arc::new(MemoryStore::new());
    let engine = offline_engine(store.clone());
    let summary = engine.evaluate(POOR_SITE).await;
    let evaluation = engine
        .get_result(&summary.evaluation_id)
        .await
        .unwrap()
        .expect("evaluation persisted");

    // no h1
    let h1 = evaluation.criterion("ACC-05").unwrap();
    assert_eq!(h1.status, CriterionStatus::Fail);
    assert_eq!(h1.score, 0.0);

    // plain http on a non-official domain
    assert_eq!(evaluation.criterion("SOB-01").unwrap().status, CriterionStatus::Fail);
    assert_eq!(evaluation.criterion("SOB-02").unwrap().status, CriterionStatus::Fail);

    // trackers are named in the evidence
    let trackers = evaluation.criterion("SOB-03").unwrap();
    assert_eq!(trackers.status, CriterionStatus::Fail);
    assert!(trackers
        .evidence
        .iter()
        .any(|e| e.contains("googletagmanager.com")));
}

// --- Result shape ---

#[tokio::test]
async fn every_catalog_criterion_appears_once_in_catalog_order() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(COMPLIANT_SITE).await;
    let evaluation = engine
        .get_result(&summary.evaluation_id)
        .await
        .unwrap()
        .unwrap();

    let codes: Vec<&str> = evaluation.criteria.iter().map(|c| c.criteria_id.as_str()).collect();
    let expected: Vec<&str> = catalog().iter().map(|d| d.code).collect();
    assert_eq!(codes, expected);
}

#[tokio::test]
async fn scores_stay_within_bounds() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    for website_id in [COMPLIANT_SITE, POOR_SITE, EMPTY_SITE] {
        let summary = engine.evaluate(website_id).await;
        let evaluation = engine
            .get_result(&summary.evaluation_id)
            .await
            .unwrap()
            .unwrap();
        assert!((0.0..=100.0).contains(&evaluation.total_score));
        for result in &evaluation.criteria {
            assert!(
                result.score >= 0.0 && result.score <= result.max_score,
                "{} scored {} of {}",
                result.criteria_id,
                result.score,
                result.max_score
            );
            if result.status == CriterionStatus::Na {
                assert_eq!(result.score, 0.0);
            }
        }
        for dimension in &evaluation.dimension_scores {
            assert!((0.0..=100.0).contains(&dimension.percentage));
        }
    }
}

#[tokio::test]
async fn dimension_weights_sum_to_total() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(POOR_SITE).await;

    assert_eq!(summary.dimension_scores.len(), Dimension::ALL.len());
    let weighted: f64 = summary.dimension_scores.iter().map(|d| d.weighted()).sum();
    assert!((weighted - summary.total_score).abs() < 0.01);
}

// --- Text analysis ---

#[tokio::test]
async fn text_analysis_scores_nlp_criteria() {
    let analyzer = Arc::new(StaticTextAnalyzer::new(sample_analysis()));
    let engine = engine_with(analyzer.clone(), Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(COMPLIANT_SITE).await;
    let evaluation = engine
        .get_result(&summary.evaluation_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(analyzer.calls(), 1);
    let nlp = evaluation.nlp.as_ref().expect("nlp summary");
    assert_eq!(nlp.source.as_str(), "nlp");
    assert_eq!(nlp.global_score, Some(82.0));
    for code in ["ACC-12", "ACC-13", "ACC-14"] {
        let result = evaluation.criterion(code).unwrap();
        assert_eq!(result.details["source"], "nlp", "{}", code);
    }
}

#[tokio::test]
async fn disabled_analyzer_falls_back_to_heuristics() {
    let engine = offline_engine(Arc::new(MemoryStore::new()));
    let summary = engine.evaluate(COMPLIANT_SITE).await;
    let evaluation = engine
        .get_result(&summary.evaluation_id)
        .await
        .unwrap()
        .unwrap();

    let nlp = evaluation.nlp.as_ref().expect("nlp summary");
    assert_eq!(nlp.source.as_str(), "heuristic");
    assert!(nlp.fallback_reason.is_some());
    assert_eq!(evaluation.criterion("ACC-12").unwrap().status, CriterionStatus::Pass);
}

// --- Persistence and history ---

#[tokio::test]
async fn json_store_keeps_history_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let first = offline_engine(Arc::new(JsonFileStore::new(dir.path())))
        .evaluate(COMPLIANT_SITE)
        .await;
    let second = offline_engine(Arc::new(JsonFileStore::new(dir.path())))
        .evaluate(COMPLIANT_SITE)
        .await;
    assert_ne!(first.evaluation_id, second.evaluation_id);

    let engine = offline_engine(Arc::new(JsonFileStore::new(dir.path())));
    let history = engine.history(COMPLIANT_SITE).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.evaluation_id);
    assert_eq!(history[1].id, second.evaluation_id);
    // same input, same result
    assert_eq!(history[0].total_score, history[1].total_score);
    assert_eq!(history[0].content_digest, history[1].content_digest);
}

#[tokio::test]
async fn evaluate_many_preserves_input_order() {
    let store = Arc::new(MemoryStore::new());
    let engine = offline_engine(store.clone()).with_concurrency(2);
    let ids = [POOR_SITE, 404, COMPLIANT_SITE, EMPTY_SITE];
    let summaries = engine.evaluate_many(&ids).await;

    let got: Vec<u64> = summaries.iter().map(|s| s.website_id).collect();
    assert_eq!(got, ids.to_vec());
    assert_eq!(summaries[1].status, EvaluationStatus::Failed);
    assert!(!summaries[1].persisted);
    assert_eq!(store.len(), 3);
}

#[test]
fn evaluate_file_public_api() {
    let path = std::path::Path::new(EXTRACTIONS).join("1.json");
    let evaluation = govaudit::evaluate_file(&path, 77).unwrap();
    assert_eq!(evaluation.website_id, 77);
    assert_eq!(evaluation.status, EvaluationStatus::Completed);
    assert_eq!(evaluation.criteria.len(), catalog().len());
}
