//! Score calculation for compliance evaluations

use crate::{CriteriaResult, Dimension, Grade, StatusCounts};
use serde::{Deserialize, Serialize};

/// Dimension weights in the total score. They sum to 1.0.
pub const WEIGHT_ACCESSIBILITY: f64 = 0.30;
pub const WEIGHT_USABILITY: f64 = 0.30;
pub const WEIGHT_TECHNICAL_SEMANTICS: f64 = 0.30;
pub const WEIGHT_SOVEREIGNTY: f64 = 0.10;

/// Dimensions under this percentage get a recommendation
const RECOMMENDATION_THRESHOLD: f64 = 70.0;

pub fn dimension_weight(dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Accessibility => WEIGHT_ACCESSIBILITY,
        Dimension::Usability => WEIGHT_USABILITY,
        Dimension::TechnicalSemantics => WEIGHT_TECHNICAL_SEMANTICS,
        Dimension::Sovereignty => WEIGHT_SOVEREIGNTY,
    }
}

/// Aggregate of one dimension's criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Sum of obtained points
    pub total_score: f64,
    /// Sum of available points over applicable criteria
    pub max_score: f64,
    /// 0-100
    pub percentage: f64,
    pub weight: f64,
    pub counts: StatusCounts,
    /// False when every criterion was not applicable
    pub complete: bool,
}

impl DimensionScore {
    /// Contribution to the weighted total
    pub fn weighted(&self) -> f64 {
        self.percentage * self.weight
    }
}

/// Output of the calculator: per-dimension scores, total and grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub dimensions: Vec<DimensionScore>,
    pub total: f64,
    pub grade: Grade,
}

/// Calculator for compliance scores
pub struct ScoreCalculator;

impl ScoreCalculator {
    /// Aggregate a complete result set. Deterministic: the same results
    /// always produce the same summary.
    pub fn calculate(results: &[CriteriaResult]) -> ScoreSummary {
        let dimensions: Vec<DimensionScore> = Dimension::ALL
            .into_iter()
            .map(|dimension| Self::dimension_score(dimension, results))
            .collect();
        let total = Self::weighted_total(&dimensions);
        ScoreSummary {
            dimensions,
            total,
            grade: Grade::from_score(total),
        }
    }

    /// Percentage of one dimension. Not-applicable criteria are left out of
    /// both numerator and denominator.
    pub fn dimension_score(dimension: Dimension, results: &[CriteriaResult]) -> DimensionScore {
        let in_dimension: Vec<&CriteriaResult> =
            results.iter().filter(|r| r.dimension == dimension).collect();
        let counts = StatusCounts::from_results(in_dimension.iter().copied());

        let (obtained, available) = in_dimension
            .iter()
            .filter(|r| r.is_applicable())
            .fold((0.0, 0.0), |(obtained, available), r| {
                (obtained + r.score.clamp(0.0, r.max_score), available + r.max_score)
            });

        let complete = available > 0.0;
        let percentage = if complete {
            (obtained / available * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        DimensionScore {
            dimension,
            total_score: obtained,
            max_score: available,
            percentage,
            weight: dimension_weight(dimension),
            counts,
            complete,
        }
    }

    /// Σ(percentage × weight), clamped to 0-100
    pub fn weighted_total(dimensions: &[DimensionScore]) -> f64 {
        dimensions
            .iter()
            .map(DimensionScore::weighted)
            .sum::<f64>()
            .clamp(0.0, 100.0)
    }

    /// Get a description of the grade
    pub fn grade_description(grade: Grade) -> &'static str {
        match grade {
            Grade::A => "Excellent - The site meets nearly every compliance criterion",
            Grade::B => "Good - The site is compliant with a few gaps",
            Grade::C => "Fair - Basic compliance, several criteria need work",
            Grade::D => "Poor - Significant compliance problems",
            Grade::F => "Failing - The site needs major remediation",
        }
    }

    /// Get recommendations based on dimension percentages
    pub fn recommendations(dimensions: &[DimensionScore]) -> Vec<String> {
        let mut recs = Vec::new();

        for score in dimensions.iter().filter(|d| d.complete) {
            if score.percentage >= RECOMMENDATION_THRESHOLD {
                continue;
            }
            let advice = match score.dimension {
                Dimension::Accessibility => {
                    "Add alternative text, labels and a clear heading structure (WCAG 2.1 AA)"
                }
                Dimension::Usability => {
                    "Improve navigation aids: landmarks, breadcrumbs and descriptive links"
                }
                Dimension::TechnicalSemantics => {
                    "Fix document metadata (doctype, charset, viewport) and publish robots.txt with a sitemap"
                }
                Dimension::Sovereignty => {
                    "Serve the site from the official domain over HTTPS and self-host scripts, fonts and styles"
                }
            };
            recs.push(format!("{} ({:.0}%): {}", score.dimension, score.percentage, advice));
        }

        if recs.is_empty() {
            recs.push("The site is in good shape! Keep monitoring after each release.".to_string());
        }

        recs
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::CriterionStatus;
    use proptest::prelude::*;

    fn arbitrary_result() -> impl Strategy<Value = CriteriaResult> {
        (
            0usize..4,
            prop::sample::select(vec![
                CriterionStatus::Pass,
                CriterionStatus::Fail,
                CriterionStatus::Partial,
                CriterionStatus::Na,
            ]),
            0.0f64..=1.0,
            1.0f64..=10.0,
        )
            .prop_map(|(dim, status, fraction, max_score)| {
                let score = match status {
                    CriterionStatus::Pass => max_score,
                    CriterionStatus::Partial => max_score * fraction,
                    CriterionStatus::Fail | CriterionStatus::Na => 0.0,
                };
                CriteriaResult {
                    criteria_id: "X-00".to_string(),
                    criteria_name: "arbitrary".to_string(),
                    dimension: Dimension::ALL[dim],
                    status,
                    score,
                    max_score,
                    details: serde_json::Value::Null,
                    evidence: vec![],
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn percentages_stay_in_bounds(results in prop::collection::vec(arbitrary_result(), 0..40)) {
            let summary = ScoreCalculator::calculate(&results);
            for d in &summary.dimensions {
                prop_assert!((0.0..=100.0).contains(&d.percentage));
                if !d.complete {
                    prop_assert_eq!(d.percentage, 0.0);
                }
            }
            prop_assert!((0.0..=100.0).contains(&summary.total));
        }

        #[test]
        fn total_equals_weighted_dimension_sum(results in prop::collection::vec(arbitrary_result(), 0..40)) {
            let summary = ScoreCalculator::calculate(&results);
            let expected: f64 = summary.dimensions.iter().map(|d| d.percentage * d.weight).sum();
            prop_assert!((summary.total - expected).abs() < 1e-9);
        }

        #[test]
        fn calculation_is_deterministic(results in prop::collection::vec(arbitrary_result(), 0..40)) {
            prop_assert_eq!(ScoreCalculator::calculate(&results), ScoreCalculator::calculate(&results));
        }
    }
}
