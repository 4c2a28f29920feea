//! Text-analysis pass: maps NLP metrics onto the descriptive-text criteria
//!
//! The external analyzer is optional. Any failure (error, timeout, metrics
//! out of range) falls back to local heuristics so a run never fails because
//! of it.

#[cfg(feature = "nlp")]
mod http;

#[cfg(feature = "nlp")]
pub use http::HttpTextAnalyzer;

use super::criteria::usability::{is_generic_link_text, normalize_text};
use super::criteria::{catalog, fraction, resolve, CriterionDef, CriterionKind, NlpMetric, Outcome};
use crate::config::NlpConfig;
use crate::error::TextAnalysisError;
use crate::extraction::{ExtractedContent, TextCorpus};
use crate::CriteriaResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Metrics cap the ratio at this value when the analyzer reports the
/// criterion's WCAG reference as not met
const NON_COMPLIANT_CAP: f64 = 0.5;

/// Labels too vague to tell the user what to enter
const GENERIC_LABELS: &[&str] = &["campo", "texto", "dato", "valor", "input", "field", "text", "value"];

/// Metrics returned by a text-analysis service (all 0-100)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalysis {
    pub global_score: f64,
    pub coherence_score: f64,
    pub ambiguity_score: f64,
    pub clarity_score: f64,
    /// WCAG success criterion ("2.4.4") -> met
    pub wcag_compliance: HashMap<String, bool>,
    pub recommendations: Vec<String>,
}

impl TextAnalysis {
    /// Reject metrics outside 0-100 (including NaN)
    pub fn validate(&self) -> Result<(), TextAnalysisError> {
        let metrics = [
            ("global_score", self.global_score),
            ("coherence_score", self.coherence_score),
            ("ambiguity_score", self.ambiguity_score),
            ("clarity_score", self.clarity_score),
        ];
        for (name, value) in metrics {
            if !(0.0..=100.0).contains(&value) {
                return Err(TextAnalysisError::InvalidResponse(format!(
                    "{} out of range: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    fn metric(&self, metric: NlpMetric) -> f64 {
        match metric {
            NlpMetric::LinkPurpose => 100.0 - self.ambiguity_score,
            NlpMetric::HeadingClarity => self.coherence_score,
            NlpMetric::LabelClarity => self.clarity_score,
        }
    }
}

/// External text-analysis collaborator
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError>;
}

/// Analyzer used offline: always unavailable, so the heuristics run
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTextAnalyzer;

#[async_trait]
impl TextAnalyzer for DisabledTextAnalyzer {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn analyze(&self, _corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError> {
        Err(TextAnalysisError::Unavailable("text analysis disabled".to_string()))
    }
}

/// Build the analyzer the configuration asks for
pub fn analyzer_from_config(config: &NlpConfig, offline: bool) -> Arc<dyn TextAnalyzer> {
    if offline || !config.enabled {
        return Arc::new(DisabledTextAnalyzer);
    }
    let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
        tracing::debug!("nlp enabled without endpoint, using heuristics");
        return Arc::new(DisabledTextAnalyzer);
    };

    #[cfg(feature = "nlp")]
    {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        Arc::new(HttpTextAnalyzer::new(endpoint).with_api_key(api_key))
    }
    #[cfg(not(feature = "nlp"))]
    {
        tracing::warn!(
            endpoint = %endpoint,
            "built without the `nlp` feature, text analysis endpoint ignored"
        );
        Arc::new(DisabledTextAnalyzer)
    }
}

/// Where the descriptive-text scores came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NlpSource {
    Nlp,
    Heuristic,
}

impl NlpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NlpSource::Nlp => "nlp",
            NlpSource::Heuristic => "heuristic",
        }
    }
}

/// Text-analysis summary stored on the evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlpSummary {
    pub source: NlpSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_score: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// Results of the NLP criteria plus the run summary
#[derive(Debug, Clone)]
pub struct NlpOutcome {
    pub results: Vec<CriteriaResult>,
    /// None when there was no text to analyze
    pub summary: Option<NlpSummary>,
}

/// Resolves the NLP-kind criteria of the catalog
pub struct NlpScoreAdapter {
    analyzer: Arc<dyn TextAnalyzer>,
    timeout: Duration,
}

impl NlpScoreAdapter {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self {
            analyzer,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn nlp_criteria() -> impl Iterator<Item = (&'static CriterionDef, NlpMetric)> {
        catalog().iter().filter_map(|def| match def.kind {
            CriterionKind::Nlp(metric) => Some((def, metric)),
            CriterionKind::Rule(_) => None,
        })
    }

    /// Evaluate ACC-12..14. Never fails.
    pub async fn evaluate(&self, content: &ExtractedContent) -> NlpOutcome {
        let Some(corpus) = content.text_corpus.as_ref().filter(|c| !c.is_empty()) else {
            return NlpOutcome {
                results: Self::nlp_criteria()
                    .map(|(def, _)| def.not_applicable("No text extracted"))
                    .collect(),
                summary: None,
            };
        };

        let analysis = match tokio::time::timeout(self.timeout, self.analyzer.analyze(corpus)).await {
            Ok(Ok(analysis)) => analysis.validate().map(|_| analysis),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(TextAnalysisError::Timeout(self.timeout.as_millis() as u64)),
        };

        match analysis {
            Ok(analysis) => {
                tracing::debug!(
                    analyzer = self.analyzer.name(),
                    global_score = analysis.global_score,
                    "text analysis completed"
                );
                NlpOutcome {
                    results: Self::nlp_criteria()
                        .map(|(def, metric)| from_analysis(def, metric, &analysis, content, corpus))
                        .collect(),
                    summary: Some(NlpSummary {
                        source: NlpSource::Nlp,
                        global_score: Some(analysis.global_score),
                        recommendations: analysis.recommendations,
                        fallback_reason: None,
                    }),
                }
            }
            Err(err) => {
                crate::obs::emit_nlp_fallback(self.analyzer.name(), &err);
                let reason = err.to_string();
                NlpOutcome {
                    results: Self::nlp_criteria()
                        .map(|(def, metric)| {
                            let outcome = heuristic(metric, content, corpus)
                                .with("source", NlpSource::Heuristic.as_str())
                                .with("fallback_reason", &reason);
                            resolve(def, outcome)
                        })
                        .collect(),
                    summary: Some(NlpSummary {
                        source: NlpSource::Heuristic,
                        global_score: None,
                        recommendations: Vec::new(),
                        fallback_reason: Some(reason),
                    }),
                }
            }
        }
    }
}

/// Number of items the metric is about; zero means not applicable
fn input_size(metric: NlpMetric, content: &ExtractedContent, corpus: &TextCorpus) -> usize {
    match metric {
        NlpMetric::LinkPurpose => corpus
            .link_texts
            .len()
            .max(content.links.as_ref().map(|l| l.total).unwrap_or(0)),
        NlpMetric::HeadingClarity => corpus.sections.len(),
        NlpMetric::LabelClarity => corpus.label_texts.len(),
    }
}

fn from_analysis(
    def: &CriterionDef,
    metric: NlpMetric,
    analysis: &TextAnalysis,
    content: &ExtractedContent,
    corpus: &TextCorpus,
) -> CriteriaResult {
    if input_size(metric, content, corpus) == 0 {
        return resolve(
            def,
            Outcome::na("Nothing to analyze for this criterion").with("source", NlpSource::Nlp.as_str()),
        );
    }

    let value = analysis.metric(metric);
    let mut ratio = value / 100.0;
    let wcag_key = def.reference.trim_start_matches("WCAG").trim();
    let compliant = analysis.wcag_compliance.get(wcag_key).copied();
    if compliant == Some(false) {
        ratio = ratio.min(NON_COMPLIANT_CAP);
    }

    let mut outcome = Outcome::ratio(ratio, format!("Text analysis score {:.1}/100", value))
        .with("source", NlpSource::Nlp.as_str())
        .with("metric", value);
    if let Some(met) = compliant {
        outcome = outcome.with("wcag_compliant", met);
    }
    if compliant == Some(false) {
        outcome = outcome.with_evidence(format!("text analysis reports WCAG {} not met", wcag_key));
    }
    resolve(def, outcome)
}

fn heuristic(metric: NlpMetric, content: &ExtractedContent, corpus: &TextCorpus) -> Outcome {
    match metric {
        NlpMetric::LinkPurpose => link_purpose_heuristic(content, corpus),
        NlpMetric::HeadingClarity => heading_heuristic(corpus),
        NlpMetric::LabelClarity => label_heuristic(corpus),
    }
}

fn link_purpose_heuristic(content: &ExtractedContent, corpus: &TextCorpus) -> Outcome {
    if let Some(links) = content.links.as_ref().filter(|l| l.total > 0) {
        let generic = links.generic_text_count.min(links.total);
        let ratio = 1.0 - generic as f64 / links.total as f64;
        return Outcome::ratio(ratio, format!("{} of {} links use generic text", generic, links.total))
            .with("generic", generic)
            .with("total", links.total);
    }

    let generic: Vec<&String> = corpus
        .link_texts
        .iter()
        .filter(|t| is_generic_link_text(t))
        .collect();
    match fraction(corpus.link_texts.len() - generic.len(), corpus.link_texts.len()) {
        None => Outcome::na("No link texts"),
        Some(ratio) => {
            let mut outcome = Outcome::ratio(
                ratio,
                format!("{} of {} link texts are generic", generic.len(), corpus.link_texts.len()),
            )
            .with("generic", generic.len())
            .with("total", corpus.link_texts.len());
            for text in generic.into_iter().take(3) {
                outcome = outcome.with_evidence(format!("generic link: \"{}\"", text));
            }
            outcome
        }
    }
}

fn heading_heuristic(corpus: &TextCorpus) -> Outcome {
    let with_heading = corpus
        .sections
        .iter()
        .filter(|s| s.heading.as_deref().is_some_and(|h| !h.trim().is_empty()))
        .count();
    match fraction(with_heading, corpus.sections.len()) {
        None => Outcome::na("No text sections"),
        Some(ratio) => Outcome::ratio(
            ratio,
            format!("{} of {} sections are introduced by a heading", with_heading, corpus.sections.len()),
        )
        .with("sections", corpus.sections.len())
        .with("with_heading", with_heading),
    }
}

/// At least two words or four letters, and not a placeholder word
pub(crate) fn is_meaningful_label(label: &str) -> bool {
    let normalized = normalize_text(label);
    if normalized.is_empty() || GENERIC_LABELS.contains(&normalized.as_str()) {
        return false;
    }
    let words = normalized.split_whitespace().count();
    let letters = normalized.chars().filter(|c| c.is_alphabetic()).count();
    words >= 2 || letters >= 4
}

fn label_heuristic(corpus: &TextCorpus) -> Outcome {
    let weak: Vec<&String> = corpus
        .label_texts
        .iter()
        .filter(|l| !is_meaningful_label(l))
        .collect();
    match fraction(corpus.label_texts.len() - weak.len(), corpus.label_texts.len()) {
        None => Outcome::na("No form labels"),
        Some(ratio) => {
            let mut outcome = Outcome::ratio(
                ratio,
                format!("{} of {} labels are too short or vague", weak.len(), corpus.label_texts.len()),
            )
            .with("labels", corpus.label_texts.len())
            .with("weak", weak.len());
            for label in weak.into_iter().take(3) {
                outcome = outcome.with_evidence(format!("weak label: \"{}\"", label));
            }
            outcome
        }
    }
}
