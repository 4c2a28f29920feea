//! Accessibility rules (WCAG 2.x, level A/AA)

use super::{
    checked_total, ensure_within, fraction, CriterionEvaluator, Outcome, RuleContext, RuleResult,
    RuleSettings,
};
use crate::extraction::ExtractedContent;
use crate::{CriteriaResult, Dimension};
use regex::Regex;
use std::sync::OnceLock;

/// Evaluates the rule-kind accessibility criteria
pub struct AccessibilityEvaluator {
    settings: RuleSettings,
}

impl AccessibilityEvaluator {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl Default for AccessibilityEvaluator {
    fn default() -> Self {
        Self::new(RuleSettings::default())
    }
}

impl CriterionEvaluator for AccessibilityEvaluator {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Accessibility
    }

    fn evaluate(&self, content: &ExtractedContent) -> Vec<CriteriaResult> {
        super::evaluate_dimension(Dimension::Accessibility, content, &self.settings)
    }
}

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 70;

fn language_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap())
}

pub(crate) fn is_valid_language_tag(tag: &str) -> bool {
    language_tag().is_match(tag.trim())
}

/// ACC-01
pub fn image_alt_text(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(images) = ctx.content.images.as_ref() else {
        return Ok(Outcome::na("No image data extracted"));
    };
    ensure_within(images.with_alt, "images.with_alt", images.total, "images.total")?;
    let Some(ratio) = fraction(images.with_alt, images.total) else {
        return Ok(Outcome::na("Page has no images"));
    };

    let missing = images.total - images.with_alt;
    let mut outcome = Outcome::ratio(
        ratio,
        format!("{} of {} images have alternative text", images.with_alt, images.total),
    )
    .with("total", images.total)
    .with("with_alt", images.with_alt)
    .with("decorative", images.decorative);
    if missing > 0 {
        outcome = outcome.with_evidence(format!("{} images without alt attribute", missing));
    }
    Ok(outcome)
}

/// ACC-02
pub fn page_language(ctx: &RuleContext<'_>) -> RuleResult {
    let lang = ctx
        .content
        .metadata
        .as_ref()
        .and_then(|m| m.lang.as_deref())
        .map(str::trim)
        .filter(|l| !l.is_empty());

    Ok(match lang {
        None => Outcome::fail("The html element does not declare a language")
            .with_evidence("<html> without lang attribute"),
        Some(lang) if is_valid_language_tag(lang) => {
            Outcome::pass(format!("Page language declared as \"{}\"", lang)).with("lang", lang)
        }
        Some(lang) => Outcome::partial(0.5, format!("\"{}\" is not a valid language tag", lang))
            .with("lang", lang)
            .with_evidence(format!("lang=\"{}\"", lang)),
    })
}

/// ACC-03
pub fn language_of_parts(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(parts) = ctx.content.language_parts.as_ref() else {
        return Ok(Outcome::na("No language-of-parts data extracted"));
    };
    ensure_within(
        parts.marked_fragments,
        "language_parts.marked_fragments",
        parts.foreign_fragments,
        "language_parts.foreign_fragments",
    )?;
    let Some(ratio) = fraction(parts.marked_fragments, parts.foreign_fragments) else {
        return Ok(Outcome::na("No passages in another language"));
    };
    Ok(Outcome::ratio(
        ratio,
        format!(
            "{} of {} foreign-language passages are marked with lang",
            parts.marked_fragments, parts.foreign_fragments
        ),
    )
    .with("foreign_fragments", parts.foreign_fragments)
    .with("marked_fragments", parts.marked_fragments))
}

/// ACC-04
pub fn page_title(ctx: &RuleContext<'_>) -> RuleResult {
    let title = ctx
        .content
        .metadata
        .as_ref()
        .and_then(|m| m.title.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(title) = title else {
        return Ok(Outcome::fail("The page has no title").with_evidence("<title> missing or empty"));
    };
    let length = title.chars().count();
    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&length) {
        Ok(Outcome::pass(format!("Page title has {} characters", length)).with("length", length))
    } else {
        Ok(Outcome::partial(
            0.5,
            format!(
                "Page title has {} characters (expected {}-{})",
                length, TITLE_MIN_CHARS, TITLE_MAX_CHARS
            ),
        )
        .with("length", length)
        .with_evidence(format!("title: \"{}\"", title)))
    }
}

/// ACC-05
pub fn single_h1(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(headings) = ctx.content.headings.as_ref() else {
        return Ok(Outcome::na("No heading data extracted"));
    };
    let outcome = match headings.h1_count {
        0 => Outcome::fail("The page has no h1 heading").with_evidence("0 h1 elements"),
        1 => Outcome::pass("The page has exactly one h1 heading"),
        n => Outcome::partial(0.5, format!("The page has {} h1 headings", n))
            .with_evidence(format!("{} h1 elements", n)),
    };
    Ok(outcome.with("h1_count", headings.h1_count))
}

/// ACC-06
pub fn heading_hierarchy(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(headings) = ctx.content.headings.as_ref() else {
        return Ok(Outcome::na("No heading data extracted"));
    };
    let total = checked_total(headings.total(), "heading counts")?;
    if total == 0 {
        return Ok(Outcome::fail("The page has no headings").with("total", 0));
    }

    let skipped = headings.skipped_levels.len().min(total);
    let ratio = 1.0 - skipped as f64 / total as f64;
    let mut outcome = Outcome::ratio(
        ratio,
        if skipped == 0 {
            format!("{} headings, no skipped levels", total)
        } else {
            format!("{} skipped heading levels across {} headings", skipped, total)
        },
    )
    .with("total", total)
    .with("skipped", skipped);
    for jump in &headings.skipped_levels {
        outcome = outcome.with_evidence(format!("skipped level: {}", jump));
    }
    Ok(outcome)
}

/// ACC-07
pub fn form_labels(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(forms) = ctx.content.forms.as_ref() else {
        return Ok(Outcome::na("No form data extracted"));
    };
    ensure_within(
        forms.inputs_with_label,
        "forms.inputs_with_label",
        forms.total_inputs,
        "forms.total_inputs",
    )?;
    let Some(ratio) = fraction(forms.inputs_with_label, forms.total_inputs) else {
        return Ok(Outcome::na("Page has no form inputs"));
    };
    let unlabeled = forms.total_inputs - forms.inputs_with_label;
    let mut outcome = Outcome::ratio(
        ratio,
        format!("{} of {} inputs have a label", forms.inputs_with_label, forms.total_inputs),
    )
    .with("total_inputs", forms.total_inputs)
    .with("inputs_with_label", forms.inputs_with_label);
    if unlabeled > 0 {
        outcome = outcome.with_evidence(format!("{} inputs without label", unlabeled));
    }
    Ok(outcome)
}

/// ACC-08
pub fn non_empty_links(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(links) = ctx.content.links.as_ref() else {
        return Ok(Outcome::na("No link data extracted"));
    };
    ensure_within(links.empty_count, "links.empty_count", links.total, "links.total")?;
    let Some(ratio) = fraction(links.total - links.empty_count, links.total) else {
        return Ok(Outcome::na("Page has no links"));
    };
    let mut outcome = Outcome::ratio(
        ratio,
        format!("{} of {} links have no accessible text", links.empty_count, links.total),
    )
    .with("total", links.total)
    .with("empty", links.empty_count);
    if links.empty_count > 0 {
        outcome = outcome.with_evidence(format!("{} empty links", links.empty_count));
    }
    Ok(outcome)
}

/// ACC-09
pub fn no_autoplay(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(media) = ctx.content.media.as_ref() else {
        return Ok(Outcome::na("No media data extracted"));
    };
    if checked_total(media.total(), "audio + video")? == 0 {
        return Ok(Outcome::na("Page has no audio or video"));
    }
    let outcome = if media.autoplay_count == 0 {
        Outcome::pass("No media starts playing automatically")
    } else {
        Outcome::fail(format!("{} media elements autoplay", media.autoplay_count))
            .with_evidence(format!("{} elements with autoplay", media.autoplay_count))
    };
    Ok(outcome.with("autoplay", media.autoplay_count))
}

/// ACC-10
pub fn video_captions(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(media) = ctx.content.media.as_ref() else {
        return Ok(Outcome::na("No media data extracted"));
    };
    ensure_within(
        media.videos_with_captions,
        "media.videos_with_captions",
        media.video_count,
        "media.video_count",
    )?;
    let Some(ratio) = fraction(media.videos_with_captions, media.video_count) else {
        return Ok(Outcome::na("Page has no video"));
    };
    Ok(Outcome::ratio(
        ratio,
        format!("{} of {} videos have captions", media.videos_with_captions, media.video_count),
    )
    .with("video_count", media.video_count)
    .with("videos_with_captions", media.videos_with_captions))
}

/// ACC-11
pub fn bypass_blocks(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(semantic) = ctx.content.semantic.as_ref() else {
        return Ok(Outcome::na("No landmark data extracted"));
    };
    Ok(if semantic.has_skip_link {
        Outcome::pass("A skip link to the main content is present")
    } else if semantic.has_main {
        Outcome::partial(0.5, "Main landmark present but no skip link")
            .with_evidence("no skip link")
    } else {
        Outcome::fail("No skip link and no main landmark")
            .with_evidence("no skip link")
            .with_evidence("no <main> element")
    })
}
