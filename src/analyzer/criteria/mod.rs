//! Compliance criteria: catalog, rule outcomes and per-dimension evaluators

pub mod accessibility;
mod catalog;
pub mod sovereignty;
pub mod technical;
pub mod usability;

pub use accessibility::AccessibilityEvaluator;
pub use catalog::{catalog, find, CATALOG_VERSION};
pub use sovereignty::SovereigntyEvaluator;
pub use technical::TechnicalSemanticsEvaluator;
pub use usability::UsabilityEvaluator;

use crate::error::CriterionDefect;
use crate::extraction::ExtractedContent;
use crate::{CriteriaResult, CriterionStatus, Dimension};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::panic::{self, AssertUnwindSafe};

/// Trait implemented by the per-dimension evaluators
pub trait CriterionEvaluator: Send + Sync {
    /// Name of the evaluator
    fn name(&self) -> &'static str;

    /// Dimension whose rule criteria this evaluator owns
    fn dimension(&self) -> Dimension;

    /// Evaluate every rule criterion of the dimension, in catalog order.
    /// Never skips a criterion and never panics on missing data.
    fn evaluate(&self, content: &ExtractedContent) -> Vec<CriteriaResult>;
}

/// All four dimension evaluators sharing one set of rule settings
pub fn evaluators(settings: &RuleSettings) -> Vec<Box<dyn CriterionEvaluator>> {
    vec![
        Box::new(AccessibilityEvaluator::new(settings.clone())),
        Box::new(UsabilityEvaluator::new(settings.clone())),
        Box::new(TechnicalSemanticsEvaluator::new(settings.clone())),
        Box::new(SovereigntyEvaluator::new(settings.clone())),
    ]
}

/// Ratio cut-offs: `ratio >= pass` passes, `ratio >= partial` earns partial credit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub pass: f64,
    pub partial: f64,
}

impl Thresholds {
    pub const fn new(pass: f64, partial: f64) -> Self {
        Self { pass, partial }
    }
}

/// Which text-analysis metric feeds an NLP criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NlpMetric {
    /// 100 - ambiguity, over link texts
    LinkPurpose,
    /// coherence, over section headings
    HeadingClarity,
    /// clarity, over form labels
    LabelClarity,
}

pub type RuleFn = fn(&RuleContext<'_>) -> RuleResult;

/// How a criterion is resolved
#[derive(Clone, Copy)]
pub enum CriterionKind {
    /// Deterministic rule over the extraction
    Rule(RuleFn),
    /// Resolved by the NLP score adapter
    Nlp(NlpMetric),
}

impl std::fmt::Debug for CriterionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriterionKind::Rule(_) => write!(f, "Rule"),
            CriterionKind::Nlp(metric) => write!(f, "Nlp({:?})", metric),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy)]
pub struct CriterionDef {
    pub code: &'static str,
    pub name: &'static str,
    pub dimension: Dimension,
    pub description: &'static str,
    /// WCAG success criterion or regulation article
    pub reference: &'static str,
    /// Points available; doubles as the criterion weight inside its dimension
    pub max_score: f64,
    pub thresholds: Thresholds,
    pub kind: CriterionKind,
}

impl CriterionDef {
    pub fn is_nlp(&self) -> bool {
        matches!(self.kind, CriterionKind::Nlp(_))
    }

    /// Not-applicable result: zero score, max_score preserved
    pub fn not_applicable(&self, reason: impl Into<String>) -> CriteriaResult {
        resolve(self, Outcome::na(reason))
    }
}

/// Settings some rules need (domain suffixes, tracker lists)
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSettings {
    /// Domain suffixes considered official government hosting
    pub official_domains: Vec<String>,
    /// Hosts whose scripts count as third-party tracking
    pub tracker_hosts: Vec<String>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            official_domains: vec![sovereignty::DEFAULT_OFFICIAL_DOMAIN.to_string()],
            tracker_hosts: sovereignty::DEFAULT_TRACKER_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

/// Inputs handed to a rule function
pub struct RuleContext<'a> {
    pub content: &'a ExtractedContent,
    pub def: &'static CriterionDef,
    pub settings: &'a RuleSettings,
}

/// What a rule concluded, before thresholds and clamping are applied
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    NotApplicable,
    Pass,
    Fail,
    /// Partial credit as a fraction of max_score
    Partial(f64),
    /// Matched fraction, resolved through the criterion thresholds
    Ratio(f64),
}

/// Rule output: verdict plus explanation and machine-readable values
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub message: String,
    pub values: Map<String, Value>,
    pub evidence: Vec<String>,
}

pub type RuleResult = Result<Outcome, CriterionDefect>;

impl Outcome {
    pub fn new(verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            verdict,
            message: message.into(),
            values: Map::new(),
            evidence: Vec::new(),
        }
    }

    pub fn na(reason: impl Into<String>) -> Self {
        Self::new(Verdict::NotApplicable, reason)
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Verdict::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Verdict::Fail, message)
    }

    pub fn partial(fraction: f64, message: impl Into<String>) -> Self {
        Self::new(Verdict::Partial(fraction), message)
    }

    pub fn ratio(ratio: f64, message: impl Into<String>) -> Self {
        Self::new(Verdict::Ratio(ratio), message)
    }

    /// Attach a machine-readable value to the details
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.values
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Turn an outcome into a result. Guarantees `0 <= score <= max_score` and
/// `na => score == 0`.
pub fn resolve(def: &CriterionDef, outcome: Outcome) -> CriteriaResult {
    let max = def.max_score;
    let (status, score) = match outcome.verdict {
        Verdict::NotApplicable => (CriterionStatus::Na, 0.0),
        Verdict::Pass => (CriterionStatus::Pass, max),
        Verdict::Fail => (CriterionStatus::Fail, 0.0),
        Verdict::Partial(fraction) => (CriterionStatus::Partial, max * clamp_fraction(fraction)),
        Verdict::Ratio(ratio) => {
            let ratio = clamp_fraction(ratio);
            if ratio >= def.thresholds.pass {
                (CriterionStatus::Pass, max)
            } else if ratio >= def.thresholds.partial {
                (CriterionStatus::Partial, max * ratio)
            } else {
                (CriterionStatus::Fail, 0.0)
            }
        }
    };

    let mut details = Map::new();
    details.insert("message".to_string(), Value::String(outcome.message));
    details.insert("reference".to_string(), Value::String(def.reference.to_string()));
    if let Verdict::Ratio(ratio) = outcome.verdict {
        details.insert("ratio".to_string(), json!(clamp_fraction(ratio)));
    }
    details.extend(outcome.values);

    CriteriaResult {
        criteria_id: def.code.to_string(),
        criteria_name: def.name.to_string(),
        dimension: def.dimension,
        status,
        score: score.clamp(0.0, max),
        max_score: max,
        details: Value::Object(details),
        evidence: outcome.evidence,
    }
}

/// A defective rule resolves to `na` with the error recorded in details
pub fn defect_result(def: &CriterionDef, defect: &CriterionDefect) -> CriteriaResult {
    let mut result = resolve(
        def,
        Outcome::na("Criterion could not be evaluated on the extracted data"),
    );
    if let Value::Object(ref mut details) = result.details {
        details.insert("error".to_string(), Value::String(defect.to_string()));
    }
    result
}

/// Evaluate every rule criterion of one dimension. A failing rule is
/// contained to its own criterion.
pub fn evaluate_dimension(
    dimension: Dimension,
    content: &ExtractedContent,
    settings: &RuleSettings,
) -> Vec<CriteriaResult> {
    catalog()
        .iter()
        .filter(|def| def.dimension == dimension)
        .filter_map(|def| match def.kind {
            CriterionKind::Rule(rule) => Some((def, rule)),
            CriterionKind::Nlp(_) => None,
        })
        .map(|(def, rule)| {
            let ctx = RuleContext {
                content,
                def,
                settings,
            };
            match apply_rule(rule, &ctx) {
                Ok(outcome) => resolve(def, outcome),
                Err(defect) => {
                    crate::obs::emit_criterion_defect(def.code, &defect);
                    defect_result(def, &defect)
                }
            }
        })
        .collect()
}

/// Run a rule, turning a panic into a defect of that criterion alone
fn apply_rule(rule: RuleFn, ctx: &RuleContext<'_>) -> RuleResult {
    match panic::catch_unwind(AssertUnwindSafe(|| rule(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(CriterionDefect::Panicked(message))
        }
    }
}

/// `part / whole`, or None when there is nothing to measure
pub(crate) fn fraction(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(part as f64 / whole as f64)
    }
}

/// Unwrap a summed count, reporting overflow as inconsistent data
pub(crate) fn checked_total(total: Option<usize>, what: &str) -> Result<usize, CriterionDefect> {
    total.ok_or_else(|| CriterionDefect::InconsistentData(format!("{} overflow", what)))
}

/// Reject sub-counts larger than their totals
pub(crate) fn ensure_within(
    part: usize,
    part_name: &str,
    whole: usize,
    whole_name: &str,
) -> Result<(), CriterionDefect> {
    if part > whole {
        return Err(CriterionDefect::InconsistentData(format!(
            "{} ({}) exceeds {} ({})",
            part_name, part, whole_name, whole
        )));
    }
    Ok(())
}

/// Run one rule criterion by code, the way `evaluate_dimension` does
#[cfg(test)]
pub(crate) fn run_rule(code: &str, content: &ExtractedContent, settings: &RuleSettings) -> CriteriaResult {
    let def = find(code).expect("criterion exists");
    let CriterionKind::Rule(rule) = def.kind else {
        panic!("{} is not a rule criterion", code);
    };
    let ctx = RuleContext {
        content,
        def,
        settings,
    };
    match apply_rule(rule, &ctx) {
        Ok(outcome) => resolve(def, outcome),
        Err(defect) => defect_result(def, &defect),
    }
}
