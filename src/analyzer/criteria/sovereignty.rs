//! Digital sovereignty rules: official hosting, transport and third-party dependencies

use super::{fraction, CriterionEvaluator, Outcome, RuleContext, RuleResult, RuleSettings};
use crate::error::CriterionDefect;
use crate::extraction::{host_of, ExtractedContent};
use crate::{CriteriaResult, Dimension};

pub const DEFAULT_OFFICIAL_DOMAIN: &str = "gob.bo";

/// Analytics, advertising and social widgets that profile visitors
pub const DEFAULT_TRACKER_HOSTS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "doubleclick.net",
    "googlesyndication.com",
    "connect.facebook.net",
    "facebook.com",
    "hotjar.com",
    "clarity.ms",
    "mc.yandex.ru",
    "static.ads-twitter.com",
    "analytics.tiktok.com",
];

/// Evaluates the rule-kind sovereignty criteria
pub struct SovereigntyEvaluator {
    settings: RuleSettings,
}

impl SovereigntyEvaluator {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl Default for SovereigntyEvaluator {
    fn default() -> Self {
        Self::new(RuleSettings::default())
    }
}

impl CriterionEvaluator for SovereigntyEvaluator {
    fn name(&self) -> &'static str {
        "sovereignty"
    }

    fn dimension(&self) -> Dimension {
        Dimension::Sovereignty
    }

    fn evaluate(&self, content: &ExtractedContent) -> Vec<CriteriaResult> {
        super::evaluate_dimension(Dimension::Sovereignty, content, &self.settings)
    }
}

/// `host` equals `suffix` or is a subdomain of it
fn matches_domain(host: &str, suffix: &str) -> bool {
    let suffix = suffix.trim().trim_start_matches('.').to_ascii_lowercase();
    !suffix.is_empty() && (host == suffix || host.ends_with(&format!(".{}", suffix)))
}

fn is_official(host: &str, settings: &RuleSettings) -> bool {
    settings
        .official_domains
        .iter()
        .any(|suffix| matches_domain(host, suffix))
}

/// Relative references, the page's own host and other official hosts are same-site
fn is_same_site(resource: &str, page_host: Option<&str>, settings: &RuleSettings) -> bool {
    match host_of(resource) {
        None => true,
        Some(host) => page_host == Some(host.as_str()) || is_official(&host, settings),
    }
}

/// Share of `resources` hosted on the site; None when the list is empty
fn self_hosted(
    ctx: &RuleContext<'_>,
    resources: &[&String],
    label: &str,
) -> Option<Outcome> {
    let page_host = ctx.content.host();
    let foreign: Vec<&String> = resources
        .iter()
        .copied()
        .filter(|r| !is_same_site(r, page_host.as_deref(), ctx.settings))
        .collect();
    let ratio = fraction(resources.len() - foreign.len(), resources.len())?;

    let mut outcome = Outcome::ratio(
        ratio,
        format!(
            "{} of {} {} are served from the institution",
            resources.len() - foreign.len(),
            resources.len(),
            label
        ),
    )
    .with("total", resources.len())
    .with("foreign", foreign.len());
    let mut hosts: Vec<String> = foreign.iter().filter_map(|r| host_of(r)).collect();
    hosts.sort();
    hosts.dedup();
    for host in hosts {
        outcome = outcome.with_evidence(format!("external host: {}", host));
    }
    Some(outcome)
}

/// SOB-01
pub fn official_domain(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(url) = ctx.content.url.as_deref() else {
        return Ok(Outcome::na("Page URL unknown"));
    };
    let host = host_of(url).ok_or_else(|| CriterionDefect::Malformed {
        field: "url",
        value: url.to_string(),
    })?;
    Ok(if is_official(&host, ctx.settings) {
        Outcome::pass(format!("{} is an official domain", host)).with("host", &host)
    } else {
        Outcome::fail(format!("{} is not under an official domain", host))
            .with("host", &host)
            .with("official_domains", &ctx.settings.official_domains)
            .with_evidence(format!("host: {}", host))
    })
}

/// SOB-02
pub fn encrypted_transport(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(url) = ctx.content.url.as_deref() else {
        return Ok(Outcome::na("Page URL unknown"));
    };
    let scheme = url
        .trim()
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase());
    match scheme.as_deref() {
        Some("https") => Ok(Outcome::pass("Served over HTTPS")),
        Some("http") => Ok(Outcome::fail("Served over plain HTTP").with_evidence(url.to_string())),
        _ => Err(CriterionDefect::Malformed {
            field: "url",
            value: url.to_string(),
        }),
    }
}

/// SOB-03
pub fn no_trackers(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(resources) = ctx.content.external_resources.as_ref() else {
        return Ok(Outcome::na("No resource data extracted"));
    };
    let trackers: Vec<String> = resources
        .scripts
        .iter()
        .chain(resources.iframes.iter())
        .filter_map(|r| host_of(r))
        .filter(|host| {
            ctx.settings
                .tracker_hosts
                .iter()
                .any(|tracker| matches_domain(host, tracker))
        })
        .collect();

    if trackers.is_empty() {
        return Ok(Outcome::pass("No third-party trackers"));
    }
    let mut outcome = Outcome::fail(format!("{} tracker resources loaded", trackers.len()))
        .with("trackers", &trackers);
    for host in &trackers {
        outcome = outcome.with_evidence(format!("tracker: {}", host));
    }
    Ok(outcome)
}

/// SOB-04
pub fn self_hosted_scripts(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(resources) = ctx.content.external_resources.as_ref() else {
        return Ok(Outcome::na("No resource data extracted"));
    };
    let scripts: Vec<&String> = resources.scripts.iter().collect();
    Ok(self_hosted(ctx, &scripts, "scripts").unwrap_or_else(|| Outcome::na("Page loads no scripts")))
}

/// SOB-05
pub fn self_hosted_assets(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(resources) = ctx.content.external_resources.as_ref() else {
        return Ok(Outcome::na("No resource data extracted"));
    };
    let assets: Vec<&String> = resources
        .fonts
        .iter()
        .chain(resources.stylesheets.iter())
        .collect();
    Ok(self_hosted(ctx, &assets, "fonts and stylesheets")
        .unwrap_or_else(|| Outcome::na("Page loads no fonts or stylesheets")))
}

/// SOB-06
pub fn no_foreign_embeds(ctx: &RuleContext<'_>) -> RuleResult {
    let Some(resources) = ctx.content.external_resources.as_ref() else {
        return Ok(Outcome::na("No resource data extracted"));
    };
    let iframes: Vec<&String> = resources.iframes.iter().collect();
    Ok(self_hosted(ctx, &iframes, "embedded frames").unwrap_or_else(|| Outcome::na("Page embeds no frames")))
}
