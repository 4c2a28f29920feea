//! govaudit: compliance scoring for government websites
//!
//! This library evaluates the structured extraction of a crawled government
//! page against accessibility (WCAG) and digital-sovereignty criteria, and
//! aggregates the per-criterion results into weighted dimension scores.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod extraction;
pub mod fakes;
pub mod history;
pub mod obs;
pub mod reporter;
pub mod store;
pub mod telemetry;

use serde::{Deserialize, Serialize};

/// Weighted category grouping compliance criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "accesibilidad")]
    Accessibility,
    #[serde(rename = "usabilidad")]
    Usability,
    #[serde(rename = "semantica_tecnica")]
    TechnicalSemantics,
    #[serde(rename = "soberania")]
    Sovereignty,
}

impl Dimension {
    /// All dimensions in reporting order
    pub const ALL: [Dimension; 4] = [
        Dimension::Accessibility,
        Dimension::Usability,
        Dimension::TechnicalSemantics,
        Dimension::Sovereignty,
    ];

    /// Stable identifier used in persisted records
    pub fn code(&self) -> &'static str {
        match self {
            Dimension::Accessibility => "accesibilidad",
            Dimension::Usability => "usabilidad",
            Dimension::TechnicalSemantics => "semantica_tecnica",
            Dimension::Sovereignty => "soberania",
        }
    }

    /// Prefix of the criterion codes belonging to this dimension
    pub fn criterion_prefix(&self) -> &'static str {
        match self {
            Dimension::Accessibility => "ACC",
            Dimension::Usability => "USA",
            Dimension::TechnicalSemantics => "SEM",
            Dimension::Sovereignty => "SOB",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Accessibility => write!(f, "Accessibility"),
            Dimension::Usability => write!(f, "Usability"),
            Dimension::TechnicalSemantics => write!(f, "Technical Semantics"),
            Dimension::Sovereignty => write!(f, "Digital Sovereignty"),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.code() == s || d.criterion_prefix().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown dimension: {}", s))
    }
}

/// Outcome of a single criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionStatus {
    Pass,
    Fail,
    Partial,
    /// Not applicable: prerequisite content absent, excluded from the denominator
    Na,
}

impl std::fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriterionStatus::Pass => write!(f, "pass"),
            CriterionStatus::Fail => write!(f, "fail"),
            CriterionStatus::Partial => write!(f, "partial"),
            CriterionStatus::Na => write!(f, "na"),
        }
    }
}

/// Result of evaluating one catalog criterion against one extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaResult {
    /// Stable catalog code (e.g. "ACC-01")
    pub criteria_id: String,
    /// Human-readable criterion name
    pub criteria_name: String,
    /// Dimension this criterion belongs to
    pub dimension: Dimension,
    /// Resolved status
    pub status: CriterionStatus,
    /// Points obtained (0..=max_score)
    pub score: f64,
    /// Points available (criterion weight)
    pub max_score: f64,
    /// Structured explanation plus machine-readable values
    pub details: serde_json::Value,
    /// Human-readable observations backing the status
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl CriteriaResult {
    /// Whether this result counts towards the scoring denominator
    pub fn is_applicable(&self) -> bool {
        self.status != CriterionStatus::Na
    }

    /// Fraction of max_score obtained
    pub fn ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }

    /// Error note recorded when the rule itself failed
    pub fn defect(&self) -> Option<&str> {
        self.details.get("error").and_then(|e| e.as_str())
    }
}

/// Per-status tallies for a set of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub partial: usize,
    pub na: usize,
}

impl StatusCounts {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a CriteriaResult>) -> Self {
        let mut counts = Self::default();
        for r in results {
            counts.record(r.status);
        }
        counts
    }

    pub fn record(&mut self, status: CriterionStatus) {
        match status {
            CriterionStatus::Pass => self.passed += 1,
            CriterionStatus::Fail => self.failed += 1,
            CriterionStatus::Partial => self.partial += 1,
            CriterionStatus::Na => self.na += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.partial + self.na
    }
}

/// Letter grade for the weighted total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
            Grade::D => write!(f, "D"),
            Grade::F => write!(f, "F"),
        }
    }
}

/// Public API: evaluate a single extraction file offline (heuristic text
/// analysis, in-memory store). Used by scripts and other programmatic consumers.
///
/// * `path` - path to an ExtractedContent JSON document
/// * `website_id` - identifier recorded on the evaluation
pub fn evaluate_file(
    path: &std::path::Path,
    website_id: u64,
) -> anyhow::Result<evaluation::Evaluation> {
    use anyhow::Context;
    use std::sync::Arc;

    let content = extraction::ExtractedContent::from_path(path)?;
    let provider = Arc::new(extraction::MemoryExtractionProvider::new().with_site(website_id, content));
    let store = Arc::new(store::MemoryStore::new());
    let engine = analyzer::EvaluationEngine::new(
        provider,
        Arc::new(analyzer::nlp::DisabledTextAnalyzer),
        store,
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let summary = engine.evaluate(website_id).await;
        if let Some(reason) = summary.error {
            anyhow::bail!("Evaluation of {} failed: {}", path.display(), reason);
        }
        engine
            .get_result(&summary.evaluation_id)
            .await?
            .with_context(|| format!("Evaluation {} was not persisted", summary.evaluation_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_from_score() {
        assert_eq!(Grade::from_score(100.0), Grade::A);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.99), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_dimension_serializes_to_stable_codes() {
        let json = serde_json::to_string(&Dimension::TechnicalSemantics).unwrap();
        assert_eq!(json, "\"semantica_tecnica\"");
        let back: Dimension = serde_json::from_str("\"soberania\"").unwrap();
        assert_eq!(back, Dimension::Sovereignty);
    }

    #[test]
    fn test_dimension_from_str_accepts_code_and_prefix() {
        assert_eq!("usabilidad".parse::<Dimension>().unwrap(), Dimension::Usability);
        assert_eq!("acc".parse::<Dimension>().unwrap(), Dimension::Accessibility);
        assert!("unknown".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_status_counts() {
        let make = |status| CriteriaResult {
            criteria_id: "ACC-01".to_string(),
            criteria_name: "x".to_string(),
            dimension: Dimension::Accessibility,
            status,
            score: 0.0,
            max_score: 1.0,
            details: serde_json::Value::Null,
            evidence: vec![],
        };
        let results = vec![
            make(CriterionStatus::Pass),
            make(CriterionStatus::Pass),
            make(CriterionStatus::Na),
            make(CriterionStatus::Partial),
        ];
        let counts = StatusCounts::from_results(&results);
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.failed, 0);
        assert_eq!(counts.partial, 1);
        assert_eq!(counts.na, 1);
        assert_eq!(counts.total(), 4);
    }
}
