//! Technical semantics rules: document metadata, landmarks, crawlability

use super::{fraction, CriterionEvaluator, Outcome, RuleContext, RuleResult, RuleSettings};
use crate::extraction::ExtractedContent;
use crate::{CriteriaResult, Dimension};
use regex::Regex;
use std::sync::OnceLock;

const SCRIPTS_PASS_MAX: usize = 15;
const SCRIPTS_PARTIAL_MAX: usize = 30;

fn device_width() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)width\s*=\s*device-width").unwrap())
}

/// Evaluates the rule-kind technical-semantics criteria
pub struct TechnicalSemanticsEvaluator {
    settings: RuleSettings,
}

impl TechnicalSemanticsEvaluator {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl Default for TechnicalSemanticsEvaluator {
    fn default() -> Self {
        Self::new(RuleSettings::default())
    }
}

impl CriterionEvaluator for TechnicalSemanticsEvaluator {
    fn name(&self) -> &'static str {
        "technical-semantics"
    }

    fn dimension(&self) -> Dimension {
        Dimension::TechnicalSemantics
    }

    fn evaluate(&self, content: &ExtractedContent) -> Vec<CriteriaResult> {
        super::evaluate_dimension(Dimension::TechnicalSemantics, content, &self.settings)
    }
}

/// SEM-01
pub fn html5_doctype(ctx: &RuleContext<'_>) -> RuleResult {
    let doctype = ctx.content.metadata.as_ref().and_then(|m| m.has_doctype);
    Ok(match doctype {
        None => Outcome::na("Doctype not reported by the crawler"),
        Some(true) => Outcome::pass("HTML5 doctype declared"),
        Some(false) => Outcome::fail("No HTML5 doctype").with_evidence("document starts without <!DOCTYPE html>"),
    })
}

/// SEM-02
pub fn utf8_charset(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(metadata) = ctx.content.metadata.as_ref() else {
        return Ok(Outcome::na("No metadata extracted"));
    };
    let charset = metadata
        .charset
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    Ok(match charset {
        None => Outcome::fail("No charset declared").with_evidence("<meta charset> missing"),
        Some(c) if c.eq_ignore_ascii_case("utf-8") || c.eq_ignore_ascii_case("utf8") => {
            Outcome::pass("UTF-8 charset declared").with("charset", c)
        }
        Some(c) => Outcome::partial(0.5, format!("Charset is {}, not UTF-8", c))
            .with("charset", c)
            .with_evidence(format!("charset={}", c)),
    })
}

/// SEM-03
pub fn responsive_viewport(ctx: &RuleContext<'_>) -> RuleResult {
    let viewport = ctx
        .content
        .metadata
        .as_ref()
        .and_then(|m| m.viewport.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    Ok(match viewport {
        None => Outcome::fail("No viewport meta tag").with_evidence("<meta name=\"viewport\"> missing"),
        Some(v) if device_width().is_match(v) => Outcome::pass("Viewport adapts to device width").with("viewport", v),
        Some(v) => Outcome::partial(0.5, "Viewport does not use width=device-width")
            .with("viewport", v)
            .with_evidence(format!("viewport: \"{}\"", v)),
    })
}

/// SEM-04
pub fn main_landmark(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(semantic) = ctx.content.semantic.as_ref() else {
        return Ok(Outcome::na("No landmark data extracted"));
    };
    Ok(if semantic.has_main || has_role(&semantic.landmark_roles, "main") {
        Outcome::pass("Main landmark present")
    } else {
        Outcome::fail("No main landmark").with_evidence("no <main> element or role=main")
    })
}

fn has_role(roles: &[String], role: &str) -> bool {
    roles.iter().any(|r| r.trim().eq_ignore_ascii_case(role))
}

/// SEM-05
pub fn landmark_structure(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(semantic) = ctx.content.semantic.as_ref() else {
        return Ok(Outcome::na("No landmark data extracted"));
    };
    let roles = &semantic.landmark_roles;
    let landmarks = [
        ("header", semantic.has_header || has_role(roles, "banner")),
        ("nav", semantic.has_nav || has_role(roles, "navigation")),
        ("main", semantic.has_main || has_role(roles, "main")),
        ("footer", semantic.has_footer || has_role(roles, "contentinfo")),
    ];
    let present = landmarks.iter().filter(|(_, found)| *found).count();
    let ratio = fraction(present, landmarks.len()).unwrap_or(0.0);

    let mut outcome = Outcome::ratio(ratio, format!("{} of {} landmarks present", present, landmarks.len()))
        .with("present", present);
    for (name, _) in landmarks.iter().filter(|(_, found)| !found) {
        outcome = outcome.with_evidence(format!("missing <{}> landmark", name));
    }
    Ok(outcome)
}

/// SEM-06
pub fn robots_published(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(robots) = ctx.content.robots.as_ref() else {
        return Ok(Outcome::na("robots.txt was not fetched"));
    };
    Ok(if robots.exists {
        Outcome::pass("robots.txt published")
    } else {
        Outcome::fail("No robots.txt").with_evidence("/robots.txt not found")
    })
}

/// SEM-07
pub fn sitemap_declared(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(robots) = ctx.content.robots.as_ref() else {
        return Ok(Outcome::na("robots.txt was not fetched"));
    };
    Ok(if robots.sitemaps.is_empty() {
        Outcome::fail("No sitemap declared").with_evidence("robots.txt has no Sitemap directive")
    } else {
        Outcome::pass(format!("{} sitemaps declared", robots.sitemaps.len())).with("sitemaps", &robots.sitemaps)
    })
}

/// SEM-08. A site without robots.txt blocks nothing.
pub fn indexable(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(robots) = ctx.content.robots.as_ref() else {
        return Ok(Outcome::na("robots.txt was not fetched"));
    };
    Ok(if !robots.exists {
        Outcome::pass("No robots.txt restrictions")
    } else if robots.allows_indexing {
        Outcome::pass("robots.txt allows indexing")
    } else {
        Outcome::fail("robots.txt blocks indexing").with_evidence("Disallow: /")
    })
}

/// SEM-09
pub fn script_weight(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(resources) = ctx.content.external_resources.as_ref() else {
        return Ok(Outcome::na("No resource data extracted"));
    };
    let scripts = resources.scripts.len();
    let outcome = if scripts <= SCRIPTS_PASS_MAX {
        Outcome::pass(format!("{} scripts loaded", scripts))
    } else if scripts <= SCRIPTS_PARTIAL_MAX {
        Outcome::partial(0.5, format!("{} scripts loaded (more than {})", scripts, SCRIPTS_PASS_MAX))
    } else {
        Outcome::fail(format!("{} scripts loaded (more than {})", scripts, SCRIPTS_PARTIAL_MAX))
    };
    Ok(outcome.with("scripts", scripts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::criteria::run_rule;
    use crate::extraction::{ExternalResources, Metadata, RobotsInfo, SemanticInfo};
    use crate::CriterionStatus;

    fn run(code: &str, content: &ExtractedContent) -> CriteriaResult {
        run_rule(code, content, &RuleSettings::default())
    }

    fn metadata(metadata: Metadata) -> ExtractedContent {
        ExtractedContent {
            metadata: Some(metadata),
            ..Default::default()
        }
    }

    #[test]
    fn test_doctype_unknown_is_na() {
        assert_eq!(run("SEM-01", &metadata(Metadata::default())).status, CriterionStatus::Na);
        let content = metadata(Metadata {
            has_doctype: Some(false),
            ..Default::default()
        });
        assert_eq!(run("SEM-01", &content).status, CriterionStatus::Fail);
    }

    #[test]
    fn test_charset_variants() {
        let charset = |c: &str| {
            metadata(Metadata {
                charset: Some(c.to_string()),
                ..Default::default()
            })
        };
        assert_eq!(run("SEM-02", &charset("UTF-8")).status, CriterionStatus::Pass);
        assert_eq!(run("SEM-02", &charset("iso-8859-1")).status, CriterionStatus::Partial);
        assert_eq!(run("SEM-02", &metadata(Metadata::default())).status, CriterionStatus::Fail);
        assert_eq!(run("SEM-02", &ExtractedContent::default()).status, CriterionStatus::Na);
    }

    #[test]
    fn test_viewport_detection() {
        let viewport = |v: &str| {
            metadata(Metadata {
                viewport: Some(v.to_string()),
                ..Default::default()
            })
        };
        assert_eq!(
            run("SEM-03", &viewport("width=device-width, initial-scale=1")).status,
            CriterionStatus::Pass
        );
        assert_eq!(run("SEM-03", &viewport("width=1024")).status, CriterionStatus::Partial);
        assert_eq!(run("SEM-03", &ExtractedContent::default()).status, CriterionStatus::Fail);
    }

    #[test]
    fn test_main_landmark() {
        let semantic = |has_main, roles: &[&str]| ExtractedContent {
            semantic: Some(SemanticInfo {
                has_main,
                landmark_roles: roles.iter().map(|r| r.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(run("SEM-04", &semantic(true, &[])).status, CriterionStatus::Pass);
        assert_eq!(run("SEM-04", &semantic(false, &[" Main "])).status, CriterionStatus::Pass);
        let r = run("SEM-04", &semantic(false, &["navigation"]));
        assert_eq!(r.status, CriterionStatus::Fail);
        assert_eq!(r.score, 0.0);
        assert_eq!(run("SEM-04", &ExtractedContent::default()).status, CriterionStatus::Na);
    }

    #[test]
    fn test_landmarks_count_aria_roles() {
        let content = ExtractedContent {
            semantic: Some(SemanticInfo {
                has_main: true,
                has_nav: true,
                landmark_roles: vec!["banner".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let r = run("SEM-05", &content);
        assert_eq!(r.status, CriterionStatus::Partial);
        assert!((r.score - r.max_score * 0.75).abs() < 1e-9);
        assert_eq!(r.evidence, vec!["missing <footer> landmark".to_string()]);
    }

    #[test]
    fn test_robots_rules() {
        let robots = |exists, allows_indexing, sitemaps: Vec<&str>| ExtractedContent {
            robots: Some(RobotsInfo {
                exists,
                allows_indexing,
                sitemaps: sitemaps.into_iter().map(String::from).collect(),
            }),
            ..Default::default()
        };
        let published = robots(true, true, vec!["https://a.gob.bo/sitemap.xml"]);
        assert_eq!(run("SEM-06", &published).status, CriterionStatus::Pass);
        assert_eq!(run("SEM-07", &published).status, CriterionStatus::Pass);
        assert_eq!(run("SEM-08", &published).status, CriterionStatus::Pass);

        let blocking = robots(true, false, vec![]);
        assert_eq!(run("SEM-07", &blocking).status, CriterionStatus::Fail);
        assert_eq!(run("SEM-08", &blocking).status, CriterionStatus::Fail);

        let missing = robots(false, false, vec![]);
        assert_eq!(run("SEM-06", &missing).status, CriterionStatus::Fail);
        assert_eq!(run("SEM-08", &missing).status, CriterionStatus::Pass);

        assert_eq!(run("SEM-06", &ExtractedContent::default()).status, CriterionStatus::Na);
    }

    #[test]
    fn test_script_weight_bands() {
        let scripts = |n: usize| ExtractedContent {
            external_resources: Some(ExternalResources {
                scripts: (0..n).map(|i| format!("/js/{}.js", i)).collect(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(run("SEM-09", &scripts(15)).status, CriterionStatus::Pass);
        let r = run("SEM-09", &scripts(16));
        assert_eq!(r.status, CriterionStatus::Partial);
        assert!((r.score - r.max_score * 0.5).abs() < 1e-9);
        assert_eq!(run("SEM-09", &scripts(31)).status, CriterionStatus::Fail);
    }
}
