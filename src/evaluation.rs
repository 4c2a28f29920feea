//! Evaluation entity and its lifecycle
//!
//! An evaluation is created `pending`, moves to `in_progress` when a run
//! starts and is finalized exactly once as `completed` or `failed`. Terminal
//! evaluations are immutable; re-evaluating a site creates a new entity.

use crate::analyzer::nlp::NlpSummary;
use crate::analyzer::scoring::{DimensionScore, ScoreSummary};
use crate::error::EvaluationError;
use crate::{CriteriaResult, Grade, StatusCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an evaluation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl EvaluationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, EvaluationStatus::Completed | EvaluationStatus::Failed)
    }

    /// Allowed edges: pending -> in_progress -> {completed, failed}.
    /// A pending run may also fail directly (missing prerequisites).
    pub fn can_transition_to(self, next: EvaluationStatus) -> bool {
        use EvaluationStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Failed) | (InProgress, Completed) | (InProgress, Failed)
        )
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "pending"),
            EvaluationStatus::InProgress => write!(f, "in_progress"),
            EvaluationStatus::Completed => write!(f, "completed"),
            EvaluationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One evaluation run of one website
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: Uuid,
    pub website_id: u64,
    pub status: EvaluationStatus,
    /// Per-dimension aggregates (empty unless completed)
    #[serde(default)]
    pub dimension_scores: Vec<DimensionScore>,
    /// Weighted total (0-100)
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    /// Ordered per-criterion audit trail
    #[serde(default)]
    pub criteria: Vec<CriteriaResult>,
    /// Text-analysis pass summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlp: Option<NlpSummary>,
    /// SHA-256 of the extraction snapshot the run was computed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,
    pub catalog_version: String,
    /// Failure cause (failed runs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// Create a pending evaluation for a website
    pub fn new(website_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            website_id,
            status: EvaluationStatus::Pending,
            dimension_scores: Vec::new(),
            total_score: 0.0,
            grade: None,
            criteria: Vec::new(),
            nlp: None,
            content_digest: None,
            catalog_version: crate::analyzer::criteria::CATALOG_VERSION.to_string(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    fn transition(&mut self, next: EvaluationStatus) -> Result<(), EvaluationError> {
        if !self.status.can_transition_to(next) {
            return Err(EvaluationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// pending -> in_progress, recording the snapshot digest
    pub fn start(&mut self, content_digest: String) -> Result<(), EvaluationError> {
        self.transition(EvaluationStatus::InProgress)?;
        self.content_digest = Some(content_digest);
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// in_progress -> completed with the full result set
    pub fn complete(
        &mut self,
        criteria: Vec<CriteriaResult>,
        scores: ScoreSummary,
        nlp: Option<NlpSummary>,
    ) -> Result<(), EvaluationError> {
        self.transition(EvaluationStatus::Completed)?;
        self.criteria = criteria;
        self.dimension_scores = scores.dimensions;
        self.total_score = scores.total;
        self.grade = Some(scores.grade);
        self.nlp = nlp;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// -> failed. Partial results are discarded.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), EvaluationError> {
        self.transition(EvaluationStatus::Failed)?;
        self.criteria.clear();
        self.dimension_scores.clear();
        self.total_score = 0.0;
        self.grade = None;
        self.nlp = None;
        self.error = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_results(&self.criteria)
    }

    pub fn dimension(&self, dimension: crate::Dimension) -> Option<&DimensionScore> {
        self.dimension_scores.iter().find(|d| d.dimension == dimension)
    }

    pub fn criterion(&self, code: &str) -> Option<&CriteriaResult> {
        self.criteria.iter().find(|c| c.criteria_id == code)
    }
}
