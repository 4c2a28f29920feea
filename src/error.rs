//! Error types for the evaluation pipeline

use crate::evaluation::EvaluationStatus;
use thiserror::Error;

/// Engine-level failures. These end a run with status `failed`.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// No extraction exists for the target site
    #[error("missing prerequisite data: no extracted content for website {website_id}")]
    MissingPrerequisite { website_id: u64 },

    /// The extraction provider itself failed
    #[error("extraction provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Commit of the evaluation failed
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// Lifecycle misuse (e.g. finalizing a completed evaluation)
    #[error("invalid evaluation transition: {from} -> {to}")]
    InvalidTransition {
        from: EvaluationStatus,
        to: EvaluationStatus,
    },

    /// Any other unrecoverable orchestration failure
    #[error("orchestration failed: {0}")]
    Orchestration(String),
}

impl EvaluationError {
    /// Short, user-visible cause for summaries and API responses
    pub fn reason(&self) -> String {
        match self {
            EvaluationError::MissingPrerequisite { .. } => "missing prerequisite data".to_string(),
            other => other.to_string(),
        }
    }
}

/// A single rule could not be evaluated on the supplied data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CriterionDefect {
    /// Counts that contradict each other (e.g. more labelled inputs than inputs)
    #[error("inconsistent data: {0}")]
    InconsistentData(String),

    /// A value that cannot be interpreted
    #[error("malformed value for {field}: {value}")]
    Malformed { field: &'static str, value: String },

    /// The rule panicked; only its own criterion is affected
    #[error("rule panicked: {0}")]
    Panicked(String),
}

/// Errors from the text-analysis collaborator. All of them trigger the
/// heuristic fallback; none abort a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextAnalysisError {
    #[error("text analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("text analysis timed out after {0}ms")]
    Timeout(u64),

    #[error("text analysis request failed: {0}")]
    RequestFailed(String),

    #[error("invalid text analysis response: {0}")]
    InvalidResponse(String),
}

/// Errors from the extraction provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("failed to read extraction {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid extraction document {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the evaluation store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stores refuse to persist a non-terminal evaluation
    #[error("evaluation {id} is not finalized (status {status})")]
    NotFinalized { id: String, status: EvaluationStatus },

    /// Terminal evaluations are immutable
    #[error("evaluation {0} already stored")]
    AlreadyExists(String),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
