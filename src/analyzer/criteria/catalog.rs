use super::{accessibility as acc, sovereignty as sob, technical as sem, usability as usa};
use super::{CriterionDef, CriterionKind, NlpMetric, Thresholds};
use crate::Dimension;

/// Version of the criterion table. Recorded on every evaluation.
pub const CATALOG_VERSION: &str = "2024.1";

const STRICT: Thresholds = Thresholds::new(1.0, 0.5);
const BINARY: Thresholds = Thresholds::new(1.0, 1.0);

static CATALOG: [CriterionDef; 38] = [
    // Accessibility
    CriterionDef {
        code: "ACC-01",
        name: "Alternative text for images",
        dimension: Dimension::Accessibility,
        description: "Images carry an alt attribute (empty for decorative images)",
        reference: "WCAG 1.1.1",
        max_score: 10.0,
        thresholds: Thresholds::new(0.9, 0.5),
        kind: CriterionKind::Rule(acc::image_alt_text),
    },
    CriterionDef {
        code: "ACC-02",
        name: "Page language declared",
        dimension: Dimension::Accessibility,
        description: "The html element declares a valid BCP-47 language tag",
        reference: "WCAG 3.1.1",
        max_score: 6.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(acc::page_language),
    },
    CriterionDef {
        code: "ACC-03",
        name: "Language of parts",
        dimension: Dimension::Accessibility,
        description: "Passages in another language are marked with their own lang attribute",
        reference: "WCAG 3.1.2",
        max_score: 3.0,
        thresholds: Thresholds::new(0.9, 0.5),
        kind: CriterionKind::Rule(acc::language_of_parts),
    },
    CriterionDef {
        code: "ACC-04",
        name: "Page titled",
        dimension: Dimension::Accessibility,
        description: "The page has a descriptive title of reasonable length",
        reference: "WCAG 2.4.2",
        max_score: 5.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(acc::page_title),
    },
    CriterionDef {
        code: "ACC-05",
        name: "Single H1 heading",
        dimension: Dimension::Accessibility,
        description: "The page has exactly one top-level heading",
        reference: "WCAG 1.3.1",
        max_score: 4.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(acc::single_h1),
    },
    CriterionDef {
        code: "ACC-06",
        name: "Heading hierarchy",
        dimension: Dimension::Accessibility,
        description: "Heading levels are nested without skipping levels",
        reference: "WCAG 1.3.1",
        max_score: 5.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(acc::heading_hierarchy),
    },
    CriterionDef {
        code: "ACC-07",
        name: "Form input labels",
        dimension: Dimension::Accessibility,
        description: "Every form input has an associated label",
        reference: "WCAG 1.3.1",
        max_score: 8.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(acc::form_labels),
    },
    CriterionDef {
        code: "ACC-08",
        name: "Non-empty links",
        dimension: Dimension::Accessibility,
        description: "Every link exposes an accessible name",
        reference: "WCAG 4.1.2",
        max_score: 5.0,
        thresholds: Thresholds::new(1.0, 0.8),
        kind: CriterionKind::Rule(acc::non_empty_links),
    },
    CriterionDef {
        code: "ACC-09",
        name: "No autoplaying media",
        dimension: Dimension::Accessibility,
        description: "Audio and video do not start playing on their own",
        reference: "WCAG 1.4.2",
        max_score: 4.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(acc::no_autoplay),
    },
    CriterionDef {
        code: "ACC-10",
        name: "Captions for video",
        dimension: Dimension::Accessibility,
        description: "Videos provide captions",
        reference: "WCAG 1.2.2",
        max_score: 5.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(acc::video_captions),
    },
    CriterionDef {
        code: "ACC-11",
        name: "Bypass blocks",
        dimension: Dimension::Accessibility,
        description: "A skip link lets keyboard users jump to the main content",
        reference: "WCAG 2.4.1",
        max_score: 5.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(acc::bypass_blocks),
    },
    CriterionDef {
        code: "ACC-12",
        name: "Descriptive link text",
        dimension: Dimension::Accessibility,
        description: "Link texts describe their destination without relying on context",
        reference: "WCAG 2.4.4",
        max_score: 5.0,
        thresholds: Thresholds::new(0.8, 0.5),
        kind: CriterionKind::Nlp(NlpMetric::LinkPurpose),
    },
    CriterionDef {
        code: "ACC-13",
        name: "Descriptive headings",
        dimension: Dimension::Accessibility,
        description: "Headings describe the topic of the content they introduce",
        reference: "WCAG 2.4.6",
        max_score: 4.0,
        thresholds: Thresholds::new(0.8, 0.5),
        kind: CriterionKind::Nlp(NlpMetric::HeadingClarity),
    },
    CriterionDef {
        code: "ACC-14",
        name: "Descriptive labels",
        dimension: Dimension::Accessibility,
        description: "Form labels and instructions are clear",
        reference: "WCAG 3.3.2",
        max_score: 4.0,
        thresholds: Thresholds::new(0.8, 0.5),
        kind: CriterionKind::Nlp(NlpMetric::LabelClarity),
    },
    // Usability
    CriterionDef {
        code: "USA-01",
        name: "Navigation landmark",
        dimension: Dimension::Usability,
        description: "The page exposes a nav region",
        reference: "DS 3925 art. 12",
        max_score: 8.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(usa::navigation_landmark),
    },
    CriterionDef {
        code: "USA-02",
        name: "Header and footer",
        dimension: Dimension::Usability,
        description: "The page has a consistent header and footer",
        reference: "DS 3925 art. 12",
        max_score: 6.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(usa::header_and_footer),
    },
    CriterionDef {
        code: "USA-03",
        name: "Breadcrumb navigation",
        dimension: Dimension::Usability,
        description: "Inner pages show where the user is in the site",
        reference: "WCAG 2.4.8",
        max_score: 4.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(usa::breadcrumbs),
    },
    CriterionDef {
        code: "USA-04",
        name: "Meta description",
        dimension: Dimension::Usability,
        description: "The page summarises itself in a 50-160 character meta description",
        reference: "DS 3925 art. 14",
        max_score: 4.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(usa::meta_description),
    },
    CriterionDef {
        code: "USA-05",
        name: "New-window warnings",
        dimension: Dimension::Usability,
        description: "Links opening a new window say so",
        reference: "WCAG 3.2.5",
        max_score: 3.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(usa::new_window_warnings),
    },
    CriterionDef {
        code: "USA-06",
        name: "Required fields marked",
        dimension: Dimension::Usability,
        description: "Required form fields are visibly identified",
        reference: "WCAG 3.3.2",
        max_score: 5.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(usa::required_fields),
    },
    CriterionDef {
        code: "USA-07",
        name: "Media controls",
        dimension: Dimension::Usability,
        description: "Audio and video expose playback controls",
        reference: "WCAG 2.1.1",
        max_score: 4.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(usa::media_controls),
    },
    CriterionDef {
        code: "USA-08",
        name: "Paragraph length",
        dimension: Dimension::Usability,
        description: "Paragraphs are short enough to scan",
        reference: "WCAG 3.1.5",
        max_score: 4.0,
        thresholds: Thresholds::new(0.8, 0.5),
        kind: CriterionKind::Rule(usa::paragraph_length),
    },
    CriterionDef {
        code: "USA-09",
        name: "Generic link text",
        dimension: Dimension::Usability,
        description: "Links avoid generic texts such as \"click aqui\" or \"ver mas\"",
        reference: "WCAG 2.4.9",
        max_score: 5.0,
        thresholds: Thresholds::new(0.9, 0.6),
        kind: CriterionKind::Rule(usa::generic_link_text),
    },
    // Technical semantics
    CriterionDef {
        code: "SEM-01",
        name: "HTML5 doctype",
        dimension: Dimension::TechnicalSemantics,
        description: "The document starts with <!DOCTYPE html>",
        reference: "HTML Living Standard 13.1.1",
        max_score: 3.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::html5_doctype),
    },
    CriterionDef {
        code: "SEM-02",
        name: "UTF-8 charset",
        dimension: Dimension::TechnicalSemantics,
        description: "The document declares UTF-8 encoding",
        reference: "HTML Living Standard 4.2.5.4",
        max_score: 3.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::utf8_charset),
    },
    CriterionDef {
        code: "SEM-03",
        name: "Responsive viewport",
        dimension: Dimension::TechnicalSemantics,
        description: "A viewport meta tag adapts the layout to the device width",
        reference: "WCAG 1.4.10",
        max_score: 5.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::responsive_viewport),
    },
    CriterionDef {
        code: "SEM-04",
        name: "Main content landmark",
        dimension: Dimension::TechnicalSemantics,
        description: "The primary content is wrapped in a main element",
        reference: "WCAG 1.3.1",
        max_score: 5.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::main_landmark),
    },
    CriterionDef {
        code: "SEM-05",
        name: "Landmark structure",
        dimension: Dimension::TechnicalSemantics,
        description: "header, nav, main and footer landmarks are all present",
        reference: "WAI-ARIA 1.2 landmarks",
        max_score: 6.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(sem::landmark_structure),
    },
    CriterionDef {
        code: "SEM-06",
        name: "robots.txt published",
        dimension: Dimension::TechnicalSemantics,
        description: "The site publishes a robots.txt file",
        reference: "RFC 9309",
        max_score: 2.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::robots_published),
    },
    CriterionDef {
        code: "SEM-07",
        name: "Sitemap declared",
        dimension: Dimension::TechnicalSemantics,
        description: "robots.txt points to at least one sitemap",
        reference: "sitemaps.org 0.9",
        max_score: 2.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::sitemap_declared),
    },
    CriterionDef {
        code: "SEM-08",
        name: "Indexable by search engines",
        dimension: Dimension::TechnicalSemantics,
        description: "robots.txt does not block indexing of public content",
        reference: "RFC 9309",
        max_score: 3.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::indexable),
    },
    CriterionDef {
        code: "SEM-09",
        name: "Script weight",
        dimension: Dimension::TechnicalSemantics,
        description: "The page loads a moderate number of scripts",
        reference: "DS 3925 art. 16",
        max_score: 4.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sem::script_weight),
    },
    // Sovereignty
    CriterionDef {
        code: "SOB-01",
        name: "Official government domain",
        dimension: Dimension::Sovereignty,
        description: "The site is served from an official government domain",
        reference: "DS 3925 art. 4",
        max_score: 8.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sob::official_domain),
    },
    CriterionDef {
        code: "SOB-02",
        name: "Encrypted transport",
        dimension: Dimension::Sovereignty,
        description: "The site is served over HTTPS",
        reference: "DS 3925 art. 18",
        max_score: 8.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sob::encrypted_transport),
    },
    CriterionDef {
        code: "SOB-03",
        name: "No third-party trackers",
        dimension: Dimension::Sovereignty,
        description: "No analytics or advertising scripts from third-party tracking hosts",
        reference: "Ley 164 art. 56",
        max_score: 6.0,
        thresholds: BINARY,
        kind: CriterionKind::Rule(sob::no_trackers),
    },
    CriterionDef {
        code: "SOB-04",
        name: "Self-hosted scripts",
        dimension: Dimension::Sovereignty,
        description: "Scripts are served from the institution's own infrastructure",
        reference: "DS 3925 art. 20",
        max_score: 5.0,
        thresholds: Thresholds::new(0.9, 0.5),
        kind: CriterionKind::Rule(sob::self_hosted_scripts),
    },
    CriterionDef {
        code: "SOB-05",
        name: "Self-hosted fonts and styles",
        dimension: Dimension::Sovereignty,
        description: "Fonts and stylesheets are served from the institution's own infrastructure",
        reference: "DS 3925 art. 20",
        max_score: 4.0,
        thresholds: Thresholds::new(0.9, 0.5),
        kind: CriterionKind::Rule(sob::self_hosted_assets),
    },
    CriterionDef {
        code: "SOB-06",
        name: "No foreign embeds",
        dimension: Dimension::Sovereignty,
        description: "Embedded frames come from the institution or other official sites",
        reference: "DS 3925 art. 20",
        max_score: 4.0,
        thresholds: STRICT,
        kind: CriterionKind::Rule(sob::no_foreign_embeds),
    },
];

/// The full criterion catalog in reporting order
pub fn catalog() -> &'static [CriterionDef] {
    &CATALOG
}

/// Look up a criterion by code (e.g. "ACC-01")
pub fn find(code: &str) -> Option<&'static CriterionDef> {
    CATALOG.iter().find(|def| def.code.eq_ignore_ascii_case(code))
}
