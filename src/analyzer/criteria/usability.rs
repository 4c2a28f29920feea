//! Usability rules: navigation aids, forms, media and readable text

use super::{
    checked_total, ensure_within, fraction, CriterionEvaluator, Outcome, RuleContext, RuleResult,
    RuleSettings,
};
use crate::extraction::ExtractedContent;
use crate::{CriteriaResult, Dimension};

/// Link texts that say nothing about their destination
pub const GENERIC_LINK_TEXTS: &[&str] = &[
    "click aqui",
    "clic aqui",
    "haga click aqui",
    "haga clic aqui",
    "aqui",
    "ver mas",
    "leer mas",
    "mas",
    "mas informacion",
    "enlace",
    "link",
    "click here",
    "here",
    "read more",
    "more",
    "learn more",
];

const META_DESCRIPTION_MIN: usize = 50;
const META_DESCRIPTION_MAX: usize = 160;
const MAX_PARAGRAPH_WORDS: usize = 120;

/// Lowercase and strip Spanish diacritics so "Aquí" matches "aqui"
pub(crate) fn normalize_text(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            c => c,
        })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_generic_link_text(text: &str) -> bool {
    let normalized = normalize_text(text);
    GENERIC_LINK_TEXTS.contains(&normalized.as_str())
}

/// Evaluates the rule-kind usability criteria
pub struct UsabilityEvaluator {
    settings: RuleSettings,
}

impl UsabilityEvaluator {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl Default for UsabilityEvaluator {
    fn default() -> Self {
        Self::new(RuleSettings::default())
    }
}

impl CriterionEvaluator for UsabilityEvaluator {
    fn name(&self) -> &'static str {
        "usability"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Usability
    }

    fn evaluate(&self, content: &ExtractedContent) -> Vec<CriteriaResult> {
        super::evaluate_dimension(Dimension::Usability, content, &self.settings)
    }
}

/// USA-01
pub fn navigation_landmark(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(semantic) = ctx.content.semantic.as_ref() else {
        return Ok(Outcome::na("No landmark data extracted"));
    };
    Ok(if semantic.has_nav {
        Outcome::pass("Navigation region present")
    } else {
        Outcome::fail("No <nav> region").with_evidence("no <nav> element or role=navigation")
    })
}

/// USA-02
pub fn header_and_footer(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(semantic) = ctx.content.semantic.as_ref() else {
        return Ok(Outcome::na("No landmark data extracted"));
    };
    let outcome = match (semantic.has_header, semantic.has_footer) {
        (true, true) => Outcome::pass("Header and footer present"),
        (true, false) => Outcome::partial(0.5, "Footer missing").with_evidence("no <footer>"),
        (false, true) => Outcome::partial(0.5, "Header missing").with_evidence("no <header>"),
        (false, false) => Outcome::fail("Header and footer missing")
            .with_evidence("no <header>")
            .with_evidence("no <footer>"),
    };
    Ok(outcome
        .with("has_header", semantic.has_header)
        .with("has_footer", semantic.has_footer))
}

/// USA-03
pub fn breadcrumbs(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(crumbs) = ctx.content.breadcrumbs.as_ref() else {
        return Ok(Outcome::na("No breadcrumb data extracted"));
    };
    Ok(if crumbs.detected {
        Outcome::pass(format!("Breadcrumb trail with {} items", crumbs.items.len()))
            .with("items", &crumbs.items)
            .with("structured_data", crumbs.has_structured_data)
    } else {
        Outcome::fail("No breadcrumb trail")
    })
}

/// USA-04
pub fn meta_description(ctx: &RuleContext<'_>) -> RuleResult {
    let description = ctx
        .content
        .metadata
        .as_ref()
        .and_then(|m| m.description.as_deref())
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let Some(description) = description else {
        return Ok(Outcome::fail("No meta description").with_evidence("<meta name=\"description\"> missing"));
    };

    let length = description.chars().count();
    let outcome = if (META_DESCRIPTION_MIN..=META_DESCRIPTION_MAX).contains(&length) {
        Outcome::pass(format!("Meta description has {} characters", length))
    } else {
        Outcome::partial(
            0.5,
            format!(
                "Meta description has {} characters (expected {}-{})",
                length, META_DESCRIPTION_MIN, META_DESCRIPTION_MAX
            ),
        )
    };
    Ok(outcome.with("length", length))
}

/// USA-05
pub fn new_window_warnings(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(links) = ctx.content.links.as_ref() else {
        return Ok(Outcome::na("No link data extracted"));
    };
    ensure_within(
        links.new_window_warned,
        "links.new_window_warned",
        links.new_window_count,
        "links.new_window_count",
    )?;
    let Some(ratio) = fraction(links.new_window_warned, links.new_window_count) else {
        return Ok(Outcome::na("No links open a new window"));
    };
    let silent = links.new_window_count - links.new_window_warned;
    let mut outcome = Outcome::ratio(
        ratio,
        format!(
            "{} of {} new-window links announce it",
            links.new_window_warned, links.new_window_count
        ),
    )
    .with("new_window", links.new_window_count)
    .with("warned", links.new_window_warned);
    if silent > 0 {
        outcome = outcome.with_evidence(format!("{} target=\"_blank\" links without warning", silent));
    }
    Ok(outcome)
}

/// USA-06
pub fn required_fields(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(forms) = ctx.content.forms.as_ref() else {
        return Ok(Outcome::na("No form data extracted"));
    };
    ensure_within(
        forms.required_marked,
        "forms.required_marked",
        forms.required_inputs,
        "forms.required_inputs",
    )?;
    let Some(ratio) = fraction(forms.required_marked, forms.required_inputs) else {
        return Ok(Outcome::na("No required fields"));
    };
    Ok(Outcome::ratio(
        ratio,
        format!(
            "{} of {} required fields are marked",
            forms.required_marked, forms.required_inputs
        ),
    )
    .with("required_inputs", forms.required_inputs)
    .with("required_marked", forms.required_marked))
}

/// USA-07
pub fn media_controls(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(media) = ctx.content.media.as_ref() else {
        return Ok(Outcome::na("No media data extracted"));
    };
    let total = checked_total(media.total(), "audio + video")?;
    ensure_within(media.with_controls, "media.with_controls", total, "audio + video")?;
    let Some(ratio) = fraction(media.with_controls, total) else {
        return Ok(Outcome::na("Page has no audio or video"));
    };
    Ok(Outcome::ratio(
        ratio,
        format!("{} of {} media elements expose controls", media.with_controls, total),
    )
    .with("media", total)
    .with("with_controls", media.with_controls))
}

/// USA-08
pub fn paragraph_length(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(corpus) = ctx.content.text_corpus.as_ref() else {
        return Ok(Outcome::na("No text extracted"));
    };
    let lengths: Vec<usize> = corpus
        .paragraphs()
        .map(|p| p.split_whitespace().count())
        .filter(|&words| words > 0)
        .collect();
    let long = lengths.iter().filter(|&&w| w > MAX_PARAGRAPH_WORDS).count();
    let Some(ratio) = fraction(lengths.len() - long, lengths.len()) else {
        return Ok(Outcome::na("No paragraphs"));
    };

    let mut outcome = Outcome::ratio(
        ratio,
        format!(
            "{} of {} paragraphs exceed {} words",
            long,
            lengths.len(),
            MAX_PARAGRAPH_WORDS
        ),
    )
    .with("paragraphs", lengths.len())
    .with("long_paragraphs", long);
    if let Some(longest) = lengths.iter().max().filter(|&&w| w > MAX_PARAGRAPH_WORDS) {
        outcome = outcome.with_evidence(format!("longest paragraph: {} words", longest));
    }
    Ok(outcome)
}

/// USA-09
pub fn generic_link_text(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(links) = ctx.content.links.as_ref() else {
        return Ok(Outcome::na("No link data extracted"));
    };
    ensure_within(
        links.generic_text_count,
        "links.generic_text_count",
        links.total,
        "links.total",
    )?;
    let Some(ratio) = fraction(links.total - links.generic_text_count, links.total) else {
        return Ok(Outcome::na("Page has no links"));
    };

    let mut outcome = Outcome::ratio(
        ratio,
        format!("{} of {} links use generic text", links.generic_text_count, links.total),
    )
    .with("total", links.total)
    .with("generic", links.generic_text_count);
    let examples = ctx
        .content
        .text_corpus
        .as_ref()
        .map(|c| {
            c.link_texts
                .iter()
                .filter(|t| is_generic_link_text(t))
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    for text in examples {
        outcome = outcome.with_evidence(format!("generic link: \"{}\"", text));
    }
    Ok(outcome)
}
