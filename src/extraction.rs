//! Extracted page content (crawler output) and the providers that load it
//!
//! Every sub-structure is optional. The crawler may omit any of them and
//! criteria must treat absence as "not applicable" or as the violation itself.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured representation of a crawled page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedContent {
    pub url: Option<String>,
    pub metadata: Option<Metadata>,
    pub images: Option<ImageInfo>,
    pub headings: Option<HeadingInfo>,
    pub forms: Option<FormInfo>,
    pub links: Option<LinkInfo>,
    pub semantic: Option<SemanticInfo>,
    pub media: Option<MediaInfo>,
    pub external_resources: Option<ExternalResources>,
    pub text_corpus: Option<TextCorpus>,
    pub robots: Option<RobotsInfo>,
    pub language_parts: Option<LanguageParts>,
    pub breadcrumbs: Option<BreadcrumbInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    pub lang: Option<String>,
    pub description: Option<String>,
    pub charset: Option<String>,
    pub viewport: Option<String>,
    pub has_doctype: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub total: usize,
    /// Images carrying an alt attribute (including alt="")
    pub with_alt: usize,
    /// Images marked decorative with alt=""
    pub decorative: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingInfo {
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
    /// Level jumps such as "h2->h4"
    pub skipped_levels: Vec<String>,
    pub texts: Vec<String>,
}

impl HeadingInfo {
    /// Headings across all levels, or None when the counts overflow
    pub fn total(&self) -> Option<usize> {
        [
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
        .into_iter()
        .try_fold(self.h1_count, usize::checked_add)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormInfo {
    pub total_forms: usize,
    pub total_inputs: usize,
    /// Inputs with an associated <label>, aria-label or aria-labelledby
    pub inputs_with_label: usize,
    pub required_inputs: usize,
    /// Required inputs visibly marked as such
    pub required_marked: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkInfo {
    pub total: usize,
    /// Links whose text is generic ("click aquí", "ver más", ...)
    pub generic_text_count: usize,
    /// Links without any accessible text
    pub empty_count: usize,
    /// Links with target="_blank"
    pub new_window_count: usize,
    /// New-window links announcing that behaviour
    pub new_window_warned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticInfo {
    pub has_nav: bool,
    pub has_header: bool,
    pub has_footer: bool,
    pub has_main: bool,
    pub has_skip_link: bool,
    pub landmark_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaInfo {
    pub autoplay_count: usize,
    pub audio_count: usize,
    pub video_count: usize,
    pub videos_with_captions: usize,
    /// Audio/video elements exposing user controls
    pub with_controls: usize,
}

impl MediaInfo {
    /// Audio plus video elements, or None when the counts overflow
    pub fn total(&self) -> Option<usize> {
        self.audio_count.checked_add(self.video_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalResources {
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
    pub fonts: Vec<String>,
    pub iframes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSection {
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
    pub word_count: usize,
}

/// Text pulled from the page, grouped by role. This is what the text-analysis
/// collaborator receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextCorpus {
    pub sections: Vec<TextSection>,
    pub total_words: usize,
    pub navigation_texts: Vec<String>,
    pub button_texts: Vec<String>,
    pub label_texts: Vec<String>,
    pub link_texts: Vec<String>,
}

impl TextCorpus {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter().map(|p| p.as_str()))
    }

    pub fn heading_texts(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| s.heading.as_deref())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
            && self.navigation_texts.is_empty()
            && self.button_texts.is_empty()
            && self.label_texts.is_empty()
            && self.link_texts.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotsInfo {
    pub exists: bool,
    pub allows_indexing: bool,
    pub sitemaps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageParts {
    /// Fragments detected in a language other than the page language
    pub foreign_fragments: usize,
    /// Of those, fragments carrying their own lang attribute
    pub marked_fragments: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreadcrumbInfo {
    pub detected: bool,
    pub items: Vec<String>,
    pub has_structured_data: bool,
}

impl ExtractedContent {
    /// Load an extraction from a JSON document on disk
    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ProviderError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// SHA-256 of the canonical JSON form, recorded on evaluations so a run
    /// can be traced back to the exact snapshot it scored.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Host part of the page URL, lowercased
    pub fn host(&self) -> Option<String> {
        self.url.as_deref().and_then(host_of)
    }
}

/// Extract the lowercased host from an absolute URL.
/// Returns None for relative references.
pub fn host_of(url: &str) -> Option<String> {
    let rest = url
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .or_else(|| url.trim().strip_prefix("//"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Source of extraction snapshots, keyed by website id
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Returns `Ok(None)` when no extraction exists for the site.
    async fn get_extracted_content(
        &self,
        website_id: u64,
    ) -> Result<Option<ExtractedContent>, ProviderError>;
}

/// Default directory of the file provider, relative to the working directory
pub const DEFAULT_EXTRACTION_DIR: &str = "extractions";

/// Reads `<dir>/<website_id>.json`
pub struct FileExtractionProvider {
    dir: PathBuf,
}

impl FileExtractionProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, website_id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", website_id))
    }
}

#[async_trait]
impl ExtractionProvider for FileExtractionProvider {
    async fn get_extracted_content(
        &self,
        website_id: u64,
    ) -> Result<Option<ExtractedContent>, ProviderError> {
        let path = self.path_for(website_id);
        if !path.exists() {
            return Ok(None);
        }
        ExtractedContent::from_path(&path).map(Some)
    }
}

/// In-memory provider backed by a `HashMap<website_id, content>`
#[derive(Debug, Default)]
pub struct MemoryExtractionProvider {
    sites: Mutex<HashMap<u64, ExtractedContent>>,
}

impl MemoryExtractionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(self, website_id: u64, content: ExtractedContent) -> Self {
        self.insert(website_id, content);
        self
    }

    pub fn insert(&self, website_id: u64, content: ExtractedContent) {
        if let Ok(mut sites) = self.sites.lock() {
            sites.insert(website_id, content);
        }
    }
}

#[async_trait]
impl ExtractionProvider for MemoryExtractionProvider {
    async fn get_extracted_content(
        &self,
        website_id: u64,
    ) -> Result<Option<ExtractedContent>, ProviderError> {
        Ok(self
            .sites
            .lock()
            .ok()
            .and_then(|sites| sites.get(&website_id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_deserializes_to_all_absent() {
        let content: ExtractedContent = serde_json::from_str("{}").unwrap();
        assert_eq!(content, ExtractedContent::default());
        assert!(content.metadata.is_none());
        assert!(content.text_corpus.is_none());
    }

    #[test]
    fn partial_substructures_fill_defaults() {
        let content: ExtractedContent =
            serde_json::from_str(r#"{"images": {"total": 4}, "headings": {"h1_count": 1}}"#)
                .unwrap();
        let images = content.images.unwrap();
        assert_eq!(images.total, 4);
        assert_eq!(images.with_alt, 0);
        assert_eq!(content.headings.unwrap().total(), Some(1));
    }

    #[test]
    fn overflowing_counts_have_no_total() {
        let headings = HeadingInfo {
            h1_count: usize::MAX,
            h2_count: 1,
            ..Default::default()
        };
        assert_eq!(headings.total(), None);
        let media = MediaInfo {
            audio_count: usize::MAX,
            video_count: 1,
            ..Default::default()
        };
        assert_eq!(media.total(), None);
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = ExtractedContent {
            url: Some("https://www.example.gob.bo".to_string()),
            ..Default::default()
        };
        let b = a.clone();
        let c = ExtractedContent::default();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn host_of_handles_common_shapes() {
        assert_eq!(
            host_of("https://www.Migracion.gob.bo/tramites?x=1"),
            Some("www.migracion.gob.bo".to_string())
        );
        assert_eq!(
            host_of("//cdn.jsdelivr.net/npm/x.js"),
            Some("cdn.jsdelivr.net".to_string())
        );
        assert_eq!(
            host_of("http://user@portal.gob.bo:8080/"),
            Some("portal.gob.bo".to_string())
        );
        assert_eq!(host_of("/static/app.js"), None);
        assert_eq!(host_of("https://"), None);
    }

    #[test]
    fn corpus_helpers() {
        let corpus = TextCorpus {
            sections: vec![
                TextSection {
                    heading: Some("Trámites".to_string()),
                    paragraphs: vec!["uno".to_string(), "dos".to_string()],
                    word_count: 2,
                },
                TextSection {
                    heading: None,
                    paragraphs: vec!["tres".to_string()],
                    word_count: 1,
                },
            ],
            ..Default::default()
        };
        assert_eq!(corpus.paragraphs().count(), 3);
        assert_eq!(corpus.heading_texts(), vec!["Trámites"]);
        assert!(!corpus.is_empty());
        assert!(TextCorpus::default().is_empty());
    }

    #[tokio::test]
    async fn file_provider_returns_none_for_missing_site() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileExtractionProvider::new(dir.path());
        assert!(provider.get_extracted_content(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_provider_reads_and_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.json"), r#"{"url": "https://a.gob.bo"}"#).unwrap();
        std::fs::write(dir.path().join("2.json"), "not json").unwrap();
        let provider = FileExtractionProvider::new(dir.path());

        let one = provider.get_extracted_content(1).await.unwrap().unwrap();
        assert_eq!(one.host().as_deref(), Some("a.gob.bo"));

        let err = provider.get_extracted_content(2).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[tokio::test]
    async fn memory_provider_roundtrip() {
        let provider = MemoryExtractionProvider::new().with_site(3, ExtractedContent::default());
        assert!(provider.get_extracted_content(3).await.unwrap().is_some());
        assert!(provider.get_extracted_content(4).await.unwrap().is_none());
    }
}
