//! JSON reporter for machine-readable output

use crate::analyzer::criteria::CriterionDef;
use crate::analyzer::engine::EvaluationSummary;
use crate::analyzer::scoring::dimension_weight;
use crate::evaluation::Evaluation;
use crate::history::HistoryEntry;
use crate::Dimension;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|_| fallback.to_string())
    }

    /// A stored evaluation with every criterion result
    pub fn report(&self, evaluation: &Evaluation) -> String {
        self.render(evaluation, "{}")
    }

    /// Run summaries plus batch totals
    pub fn report_summaries(&self, summaries: &[EvaluationSummary]) -> String {
        let completed: Vec<&EvaluationSummary> =
            summaries.iter().filter(|s| s.is_completed()).collect();
        let average_score = if completed.is_empty() {
            None
        } else {
            Some(completed.iter().map(|s| s.total_score).sum::<f64>() / completed.len() as f64)
        };
        let output = JsonOutput {
            results: summaries,
            summary: JsonSummary {
                websites_evaluated: summaries.len(),
                completed: completed.len(),
                failed: summaries.len() - completed.len(),
                average_score,
            },
        };
        self.render(&output, "{}")
    }

    pub fn report_history(&self, entries: &[HistoryEntry]) -> String {
        self.render(entries, "[]")
    }

    pub fn report_catalog(&self, catalog: &[CriterionDef], version: &str) -> String {
        let output = CatalogOutput {
            version,
            weights: Dimension::ALL
                .iter()
                .map(|d| DimensionWeight {
                    dimension: *d,
                    weight: dimension_weight(*d),
                })
                .collect(),
            criteria: catalog.iter().map(CatalogEntry::from).collect(),
        };
        self.render(&output, "{}")
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: &'a [EvaluationSummary],
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    websites_evaluated: usize,
    completed: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    average_score: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogOutput<'a> {
    version: &'a str,
    weights: Vec<DimensionWeight>,
    criteria: Vec<CatalogEntry>,
}

#[derive(Serialize)]
struct DimensionWeight {
    dimension: Dimension,
    weight: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    code: &'static str,
    name: &'static str,
    dimension: Dimension,
    description: &'static str,
    reference: &'static str,
    max_score: f64,
    pass_threshold: f64,
    partial_threshold: f64,
    text_analysis: bool,
}

impl From<&CriterionDef> for CatalogEntry {
    fn from(def: &CriterionDef) -> Self {
        Self {
            code: def.code,
            name: def.name,
            dimension: def.dimension,
            description: def.description,
            reference: def.reference,
            max_score: def.max_score,
            pass_threshold: def.thresholds.pass,
            partial_threshold: def.thresholds.partial,
            text_analysis: def.is_nlp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::criteria::{catalog, CATALOG_VERSION};
    use crate::analyzer::scoring::ScoreCalculator;
    use crate::evaluation::EvaluationStatus;

    fn completed(website_id: u64) -> Evaluation {
        let mut evaluation = Evaluation::new(website_id);
        evaluation.start("digest".to_string()).unwrap();
        evaluation
            .complete(Vec::new(), ScoreCalculator::calculate(&[]), None)
            .unwrap();
        evaluation
    }

    #[test]
    fn test_json_evaluation_has_expected_keys() {
        let reporter = JsonReporter::new();
        let json = reporter.report(&completed(3));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["websiteId"], 3);
        assert_eq!(parsed["status"], "completed");
        assert!(parsed.get("criteria").is_some());
        assert!(parsed.get("dimensionScores").is_some());
        assert!(parsed.get("catalogVersion").is_some());
    }

    #[test]
    fn test_json_pretty_output() {
        let reporter = JsonReporter::new().pretty();
        let json = reporter.report(&completed(1));
        assert!(json.contains('\n'), "pretty JSON should have newlines");
        assert!(json.contains("  "), "pretty JSON should have indentation");
    }

    #[test]
    fn test_json_report_summaries_empty() {
        let reporter = JsonReporter::new();
        let parsed: serde_json::Value =
            serde_json::from_str(&reporter.report_summaries(&[])).unwrap();
        assert_eq!(parsed["summary"]["websitesEvaluated"], 0);
        assert!(parsed["summary"].get("averageScore").is_none());
        assert!(parsed["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_json_history() {
        let evaluation = completed(9);
        let entries = vec![HistoryEntry::from(&evaluation)];
        let parsed: serde_json::Value =
            serde_json::from_str(&JsonReporter::new().report_history(&entries)).unwrap();
        let arr = parsed.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["status"], serde_json::json!(EvaluationStatus::Completed));
        assert_eq!(arr[0]["evaluationId"], evaluation.id.to_string());
    }

    #[test]
    fn test_json_catalog() {
        let json = JsonReporter::new().report_catalog(catalog(), CATALOG_VERSION);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["version"], CATALOG_VERSION);
        assert_eq!(parsed["weights"].as_array().unwrap().len(), 4);
        let criteria = parsed["criteria"].as_array().unwrap();
        assert_eq!(criteria.len(), catalog().len());
        assert_eq!(criteria[0]["code"], "ACC-01");
        assert!(criteria.iter().any(|c| c["textAnalysis"] == true));
    }
}
