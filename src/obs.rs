//! Structured observability hooks for the evaluation lifecycle.
//!
//! - `EvaluationSpan` RAII guard scoping every event of one run
//! - `emit_*` functions for start, finish, NLP fallback, rule defects and
//!   persistence failures

use crate::error::{CriterionDefect, TextAnalysisError};
use crate::evaluation::EvaluationStatus;
use tracing::{info, warn};
use uuid::Uuid;

/// RAII guard that enters a span tagged with the evaluation and website ids.
///
/// ```ignore
/// let _span = EvaluationSpan::enter(&evaluation.id, evaluation.website_id);
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    pub fn enter(evaluation_id: &Uuid, website_id: u64) -> Self {
        Self {
            _span: evaluation_span(evaluation_id, website_id).entered(),
        }
    }
}

/// The run span itself, for futures (`.instrument(span)`); an entered
/// guard cannot be held across `.await` in a `Send` future.
pub fn evaluation_span(evaluation_id: &Uuid, website_id: u64) -> tracing::Span {
    tracing::info_span!(
        "govaudit.evaluation",
        evaluation_id = %evaluation_id,
        website_id = website_id
    )
}

/// Emit event: run started.
pub fn emit_evaluation_started(evaluation_id: &Uuid, website_id: u64, content_digest: &str) {
    info!(
        event = "evaluation.started",
        evaluation_id = %evaluation_id,
        website_id = website_id,
        content_digest = %content_digest,
    );
}

/// Emit event: run finished (completed or failed).
pub fn emit_evaluation_finished(
    evaluation_id: &Uuid,
    status: EvaluationStatus,
    total_score: f64,
    duration_ms: u64,
) {
    info!(
        event = "evaluation.finished",
        evaluation_id = %evaluation_id,
        status = %status,
        total_score = total_score,
        duration_ms = duration_ms,
    );
}

/// Emit event: prerequisite extraction missing, nothing persisted.
pub fn emit_missing_prerequisite(website_id: u64) {
    warn!(event = "evaluation.missing_prerequisite", website_id = website_id);
}

/// Emit event: text analysis unavailable, heuristics used instead.
pub fn emit_nlp_fallback(analyzer: &str, error: &TextAnalysisError) {
    warn!(event = "nlp.fallback", analyzer = %analyzer, error = %error);
}

/// Emit event: a rule could not evaluate its data.
pub fn emit_criterion_defect(code: &str, defect: &CriterionDefect) {
    warn!(event = "criterion.defect", criterion = %code, error = %defect);
}

/// Emit event: saving the evaluation failed.
pub fn emit_persistence_failed(evaluation_id: &Uuid, error: &dyn std::fmt::Display) {
    warn!(event = "evaluation.persistence_failed", evaluation_id = %evaluation_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn test_defect_event_carries_span_fields() {
        let evaluation_id = Uuid::new_v4();
        let logs = capture(|| {
            let _span = EvaluationSpan::enter(&evaluation_id, 42);
            emit_criterion_defect(
                "ACC-01",
                &CriterionDefect::InconsistentData("with_alt > total".to_string()),
            );
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("criterion.defect"));
        assert!(logs.contains("criterion=ACC-01"));
        assert!(logs.contains("website_id=42"));
        assert!(logs.contains(&evaluation_id.to_string()));
    }

    #[test]
    fn test_nlp_fallback_event() {
        let logs = capture(|| emit_nlp_fallback("http", &TextAnalysisError::Timeout(500)));
        assert!(logs.contains("nlp.fallback"));
        assert!(logs.contains("timed out after 500ms"));
    }
}
