//! Trend tracking - compare a run with earlier evaluations of the same site

use crate::evaluation::{Evaluation, EvaluationStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One row of a website's evaluation history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub evaluation_id: Uuid,
    pub status: EvaluationStatus,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Evaluation> for HistoryEntry {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            evaluation_id: evaluation.id,
            status: evaluation.status,
            total_score: evaluation.total_score,
            created_at: evaluation.created_at,
            error: evaluation.error.clone(),
        }
    }
}

/// Total of the latest completed evaluation created before `current`.
/// `history` is oldest first, as returned by the store.
pub fn previous_score(history: &[Evaluation], current: &Evaluation) -> Option<f64> {
    history
        .iter()
        .rev()
        .find(|e| {
            e.id != current.id
                && e.status == EvaluationStatus::Completed
                && e.created_at <= current.created_at
        })
        .map(|e| e.total_score)
}

/// Format delta for console: "[was 82.0, down 4.0]" or "[was 82.0, up 2.5]" or ""
pub fn format_delta(previous: Option<f64>, current: f64) -> String {
    let Some(prev) = previous else {
        return String::new();
    };
    let diff = ((current - prev) * 10.0).round() / 10.0;
    if diff == 0.0 {
        return format!(" [unchanged at {:.1}]", current);
    }
    if diff > 0.0 {
        format!(" [was {:.1}, up {:.1}]", prev, diff)
    } else {
        format!(" [was {:.1}, down {:.1}]", prev, -diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::scoring::ScoreCalculator;

    fn completed(website_id: u64, total: f64) -> Evaluation {
        let mut evaluation = Evaluation::new(website_id);
        evaluation.start("d".to_string()).unwrap();
        evaluation
            .complete(Vec::new(), ScoreCalculator::calculate(&[]), None)
            .unwrap();
        evaluation.total_score = total;
        evaluation
    }

    // --- format_delta ---

    #[test]
    fn format_delta_no_previous_returns_empty() {
        assert_eq!(format_delta(None, 85.0), "");
    }

    #[test]
    fn format_delta_score_increased() {
        assert_eq!(format_delta(Some(82.0), 84.5), " [was 82.0, up 2.5]");
    }

    #[test]
    fn format_delta_score_decreased() {
        assert_eq!(format_delta(Some(90.0), 86.0), " [was 90.0, down 4.0]");
    }

    #[test]
    fn format_delta_score_unchanged() {
        assert_eq!(format_delta(Some(75.0), 75.02), " [unchanged at 75.0]");
    }

    // --- previous_score ---

    #[test]
    fn previous_score_empty_history_returns_none() {
        let current = completed(1, 50.0);
        assert_eq!(previous_score(&[], &current), None);
    }

    #[test]
    fn previous_score_skips_current_and_failed_runs() {
        let older = completed(1, 61.0);
        let mut failed = Evaluation::new(1);
        failed.fail("missing prerequisite data").unwrap();
        let current = completed(1, 70.0);

        let history = vec![older, failed, current.clone()];
        assert_eq!(previous_score(&history, &current), Some(61.0));
    }

    #[test]
    fn history_entry_from_evaluation() {
        let evaluation = completed(4, 88.5);
        let entry = HistoryEntry::from(&evaluation);
        assert_eq!(entry.evaluation_id, evaluation.id);
        assert_eq!(entry.total_score, 88.5);
        assert!(entry.error.is_none());
    }
}
