//! Evaluation engine - orchestrates evaluators, text analysis, scoring and persistence
//!
//! One run: load the extraction, fan out the four rule evaluators (rayon, on a
//! blocking thread) and the text-analysis adapter (async) concurrently, join,
//! score, then commit the evaluation and all of its criterion results in one
//! store call.

use super::criteria::{catalog, evaluators, RuleSettings};
use super::nlp::{NlpScoreAdapter, NlpSummary, TextAnalyzer, DEFAULT_TIMEOUT_MS};
use super::scoring::{DimensionScore, ScoreCalculator};
use crate::error::EvaluationError;
use crate::evaluation::{Evaluation, EvaluationStatus};
use crate::extraction::{ExtractedContent, ExtractionProvider};
use crate::obs::{self, EvaluationSpan};
use crate::store::EvaluationStore;
use crate::{CriteriaResult, Grade, StatusCounts};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

/// Default number of websites evaluated at once by `evaluate_many`
pub const DEFAULT_CONCURRENCY: usize = 4;

/// What a caller gets back from a run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub evaluation_id: Uuid,
    pub website_id: u64,
    pub status: EvaluationStatus,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    pub dimension_scores: Vec<DimensionScore>,
    pub counts: StatusCounts,
    /// Human-readable failure cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the evaluation row was written
    pub persisted: bool,
    pub duration_ms: u64,
}

impl EvaluationSummary {
    fn from_evaluation(evaluation: &Evaluation, persisted: bool, duration_ms: u64) -> Self {
        Self {
            evaluation_id: evaluation.id,
            website_id: evaluation.website_id,
            status: evaluation.status,
            total_score: evaluation.total_score,
            grade: evaluation.grade,
            dimension_scores: evaluation.dimension_scores.clone(),
            counts: evaluation.counts(),
            error: evaluation.error.clone(),
            persisted,
            duration_ms,
        }
    }

    /// Summary for a run that could not even be driven (task panicked)
    fn aborted(website_id: u64, reason: String) -> Self {
        Self {
            evaluation_id: Uuid::new_v4(),
            website_id,
            status: EvaluationStatus::Failed,
            total_score: 0.0,
            grade: None,
            dimension_scores: Vec::new(),
            counts: StatusCounts::default(),
            error: Some(reason),
            persisted: false,
            duration_ms: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EvaluationStatus::Completed
    }
}

/// Main evaluation engine. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct EvaluationEngine {
    provider: Arc<dyn ExtractionProvider>,
    analyzer: Arc<dyn TextAnalyzer>,
    store: Arc<dyn EvaluationStore>,
    settings: Arc<RuleSettings>,
    nlp_timeout: Duration,
    concurrency: usize,
}

impl EvaluationEngine {
    /// Create a new engine
    pub fn new(
        provider: Arc<dyn ExtractionProvider>,
        analyzer: Arc<dyn TextAnalyzer>,
        store: Arc<dyn EvaluationStore>,
    ) -> Self {
        Self {
            provider,
            analyzer,
            store,
            settings: Arc::new(RuleSettings::default()),
            nlp_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Bound for each text-analysis call
    pub fn with_nlp_timeout(mut self, timeout: Duration) -> Self {
        self.nlp_timeout = timeout;
        self
    }

    /// Official domains and tracker hosts used by the sovereignty rules
    pub fn with_rule_settings(mut self, settings: RuleSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Maximum number of concurrent runs in `evaluate_many` (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Evaluate one website. Never returns an error: failures are reported
    /// as a `failed` summary carrying the cause.
    pub async fn evaluate(&self, website_id: u64) -> EvaluationSummary {
        let evaluation = Evaluation::new(website_id);
        let span = obs::evaluation_span(&evaluation.id, website_id);
        self.run(evaluation).instrument(span).await
    }

    async fn run(&self, mut evaluation: Evaluation) -> EvaluationSummary {
        let started = Instant::now();
        let website_id = evaluation.website_id;

        let content = match self.provider.get_extracted_content(website_id).await {
            Ok(Some(content)) => Arc::new(content),
            Ok(None) => {
                // Nothing is persisted for a run that never had its inputs
                obs::emit_missing_prerequisite(website_id);
                let err = EvaluationError::MissingPrerequisite { website_id };
                if let Err(e) = evaluation.fail(err.reason()) {
                    tracing::error!(error = %e, "could not mark evaluation failed");
                }
                return self.finish(&evaluation, false, started);
            }
            Err(e) => return self.abort(evaluation, e.into(), started).await,
        };

        let digest = content.digest();
        if let Err(e) = evaluation.start(digest.clone()) {
            return self.abort(evaluation, e, started).await;
        }
        obs::emit_evaluation_started(&evaluation.id, website_id, &digest);

        let (criteria, nlp) = match self.compute(&evaluation, content).await {
            Ok(computed) => computed,
            Err(e) => return self.abort(evaluation, e, started).await,
        };

        let scores = ScoreCalculator::calculate(&criteria);
        let mut finished = evaluation.clone();
        if let Err(e) = finished.complete(criteria, scores, nlp) {
            return self.abort(evaluation, e, started).await;
        }

        match self.store.save(&finished).await {
            Ok(()) => self.finish(&finished, true, started),
            Err(e) => {
                obs::emit_persistence_failed(&finished.id, &e);
                self.abort(evaluation, EvaluationError::Persistence(e), started)
                    .await
            }
        }
    }

    /// Fan out the rule evaluators and the text analysis, then join them
    async fn compute(
        &self,
        evaluation: &Evaluation,
        content: Arc<ExtractedContent>,
    ) -> Result<(Vec<CriteriaResult>, Option<NlpSummary>), EvaluationError> {
        let rules = {
            let content = Arc::clone(&content);
            let settings = Arc::clone(&self.settings);
            let (id, website_id) = (evaluation.id, evaluation.website_id);
            tokio::task::spawn_blocking(move || {
                let _span = EvaluationSpan::enter(&id, website_id);
                evaluate_rules(&content, &settings)
            })
        };
        let adapter = NlpScoreAdapter::new(Arc::clone(&self.analyzer)).with_timeout(self.nlp_timeout);

        let (rules, nlp) = tokio::join!(rules, adapter.evaluate(&content));
        let mut results = rules.map_err(|e| {
            EvaluationError::Orchestration(format!("rule evaluation task failed: {}", e))
        })?;
        results.extend(nlp.results);

        Ok((order_by_catalog(results)?, nlp.summary))
    }

    /// in_progress/pending -> failed. Partial results are dropped; a failure
    /// marker is persisted when the store accepts it.
    async fn abort(
        &self,
        mut evaluation: Evaluation,
        error: EvaluationError,
        started: Instant,
    ) -> EvaluationSummary {
        if let Err(e) = evaluation.fail(error.reason()) {
            tracing::error!(error = %e, "could not mark evaluation failed");
        }
        let persisted = match self.store.save(&evaluation).await {
            Ok(()) => true,
            Err(e) => {
                obs::emit_persistence_failed(&evaluation.id, &e);
                false
            }
        };
        self.finish(&evaluation, persisted, started)
    }

    fn finish(&self, evaluation: &Evaluation, persisted: bool, started: Instant) -> EvaluationSummary {
        let duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_evaluation_finished(
            &evaluation.id,
            evaluation.status,
            evaluation.total_score,
            duration_ms,
        );
        EvaluationSummary::from_evaluation(evaluation, persisted, duration_ms)
    }

    /// Evaluate several websites concurrently. Summaries come back in input order.
    pub async fn evaluate_many(&self, website_ids: &[u64]) -> Vec<EvaluationSummary> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        for (idx, website_id) in website_ids.iter().copied().enumerate() {
            let engine = self.clone();
            let permits = Arc::clone(&permits);
            join_set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                (idx, engine.evaluate(website_id).await)
            });
        }

        let mut ordered: Vec<Option<EvaluationSummary>> = vec![None; website_ids.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, summary)) => ordered[idx] = Some(summary),
                Err(e) => tracing::error!(error = %e, "evaluation task join error"),
            }
        }

        ordered
            .into_iter()
            .zip(website_ids)
            .map(|(slot, &website_id)| {
                slot.unwrap_or_else(|| {
                    EvaluationSummary::aborted(
                        website_id,
                        EvaluationError::Orchestration("evaluation task did not complete".to_string())
                            .reason(),
                    )
                })
            })
            .collect()
    }

    /// Load a persisted evaluation with its criterion results
    pub async fn get_result(&self, evaluation_id: &Uuid) -> Result<Option<Evaluation>, EvaluationError> {
        Ok(self.store.get(evaluation_id).await?)
    }

    /// All persisted evaluations of a website, oldest first
    pub async fn history(&self, website_id: u64) -> Result<Vec<Evaluation>, EvaluationError> {
        Ok(self.store.list_for_website(website_id).await?)
    }
}

/// Run the four dimension evaluators in parallel on the rayon pool
pub fn evaluate_rules(content: &ExtractedContent, settings: &RuleSettings) -> Vec<CriteriaResult> {
    use rayon::prelude::*;

    evaluators(settings)
        .par_iter()
        .map(|evaluator| evaluator.evaluate(content))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Order results by catalog position and check that every catalog entry
/// has exactly one result
fn order_by_catalog(results: Vec<CriteriaResult>) -> Result<Vec<CriteriaResult>, EvaluationError> {
    let mut by_code: HashMap<String, CriteriaResult> = HashMap::with_capacity(results.len());
    for result in results {
        let code = result.criteria_id.clone();
        if by_code.insert(code.clone(), result).is_some() {
            return Err(EvaluationError::Orchestration(format!(
                "criterion {} evaluated twice",
                code
            )));
        }
    }

    let ordered = catalog()
        .iter()
        .map(|def| {
            by_code.remove(def.code).ok_or_else(|| {
                EvaluationError::Orchestration(format!("criterion {} has no result", def.code))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(code) = by_code.keys().next() {
        return Err(EvaluationError::Orchestration(format!(
            "result for unknown criterion {}",
            code
        )));
    }
    Ok(ordered)
}
