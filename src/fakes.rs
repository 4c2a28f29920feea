//! Deterministic collaborators for tests and offline demos
//!
//! Text analyzers with canned answers, failure injection for the extraction
//! provider and the store, and a realistic sample extraction.

use crate::analyzer::nlp::{TextAnalysis, TextAnalyzer};
use crate::error::{ProviderError, StoreError, StoreResult, TextAnalysisError};
use crate::evaluation::Evaluation;
use crate::extraction::*;
use crate::store::EvaluationStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Always returns the same analysis; counts calls
#[derive(Debug, Default)]
pub struct StaticTextAnalyzer {
    analysis: TextAnalysis,
    calls: AtomicUsize,
}

impl StaticTextAnalyzer {
    pub fn new(analysis: TextAnalysis) -> Self {
        Self {
            analysis,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextAnalyzer for StaticTextAnalyzer {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn analyze(&self, _corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.analysis.clone())
    }
}

/// Always fails with the given error
#[derive(Debug)]
pub struct FailingTextAnalyzer {
    error: TextAnalysisError,
}

impl FailingTextAnalyzer {
    pub fn new(error: TextAnalysisError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl TextAnalyzer for FailingTextAnalyzer {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn analyze(&self, _corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError> {
        Err(self.error.clone())
    }
}

/// Answers after a delay (drives the timeout path)
#[derive(Debug)]
pub struct SlowTextAnalyzer {
    delay: Duration,
    analysis: TextAnalysis,
}

impl SlowTextAnalyzer {
    pub fn new(delay: Duration, analysis: TextAnalysis) -> Self {
        Self { delay, analysis }
    }
}

#[async_trait]
impl TextAnalyzer for SlowTextAnalyzer {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn analyze(&self, _corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.analysis.clone())
    }
}

/// Provider whose backend is broken (not the same as "not found")
#[derive(Debug, Default)]
pub struct FailingExtractionProvider;

impl FailingExtractionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtractionProvider for FailingExtractionProvider {
    async fn get_extracted_content(
        &self,
        website_id: u64,
    ) -> Result<Option<ExtractedContent>, ProviderError> {
        Err(ProviderError::Io {
            path: format!("{}.json", website_id),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        })
    }
}

/// Store that rejects every write
#[derive(Debug)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl EvaluationStore for FailingStore {
    async fn save(&self, _evaluation: &Evaluation) -> StoreResult<()> {
        Err(StoreError::Backend(self.message.clone()))
    }

    async fn get(&self, _id: &Uuid) -> StoreResult<Option<Evaluation>> {
        Ok(None)
    }

    async fn list_for_website(&self, _website_id: u64) -> StoreResult<Vec<Evaluation>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: &Uuid) -> StoreResult<bool> {
        Ok(false)
    }
}

/// Analysis of a reasonably well-written page
pub fn sample_analysis() -> TextAnalysis {
    let mut wcag_compliance = HashMap::new();
    wcag_compliance.insert("2.4.4".to_string(), true);
    wcag_compliance.insert("2.4.6".to_string(), true);
    wcag_compliance.insert("3.3.2".to_string(), true);
    TextAnalysis {
        global_score: 82.0,
        coherence_score: 88.0,
        ambiguity_score: 15.0,
        clarity_score: 79.0,
        wcag_compliance,
        recommendations: vec!["Replace \"Ver más\" with the name of the destination page".to_string()],
    }
}

/// Extraction of a typical ministry home page with a few problems
pub fn sample_extraction() -> ExtractedContent {
    ExtractedContent {
        url: Some("https://www.migracion.gob.bo/".to_string()),
        metadata: Some(Metadata {
            title: Some("Dirección General de Migración".to_string()),
            lang: Some("es".to_string()),
            description: Some(
                "Portal oficial de la Dirección General de Migración: pasaportes, visas y trámites en línea."
                    .to_string(),
            ),
            charset: Some("UTF-8".to_string()),
            viewport: Some("width=device-width, initial-scale=1".to_string()),
            has_doctype: Some(true),
        }),
        images: Some(ImageInfo {
            total: 12,
            with_alt: 11,
            decorative: 2,
        }),
        headings: Some(HeadingInfo {
            h1_count: 1,
            h2_count: 4,
            h3_count: 6,
            skipped_levels: Vec::new(),
            texts: vec!["Trámites".to_string(), "Pasaportes".to_string()],
            ..Default::default()
        }),
        forms: Some(FormInfo {
            total_forms: 1,
            total_inputs: 3,
            inputs_with_label: 3,
            required_inputs: 1,
            required_marked: 1,
        }),
        links: Some(LinkInfo {
            total: 40,
            generic_text_count: 3,
            empty_count: 0,
            new_window_count: 4,
            new_window_warned: 2,
        }),
        semantic: Some(SemanticInfo {
            has_nav: true,
            has_header: true,
            has_footer: true,
            has_main: true,
            has_skip_link: false,
            landmark_roles: vec!["navigation".to_string(), "main".to_string()],
        }),
        media: Some(MediaInfo::default()),
        external_resources: Some(ExternalResources {
            scripts: vec![
                "/js/app.js".to_string(),
                "https://www.migracion.gob.bo/js/menu.js".to_string(),
                "https://www.googletagmanager.com/gtag/js?id=G-XXXX".to_string(),
            ],
            stylesheets: vec!["/css/main.css".to_string()],
            fonts: vec!["https://fonts.googleapis.com/css2?family=Roboto".to_string()],
            iframes: Vec::new(),
        }),
        text_corpus: Some(TextCorpus {
            sections: vec![
                TextSection {
                    heading: Some("Trámites en línea".to_string()),
                    paragraphs: vec![
                        "Solicite su pasaporte electrónico y siga el estado de su trámite.".to_string(),
                    ],
                    word_count: 11,
                },
                TextSection {
                    heading: Some("Requisitos".to_string()),
                    paragraphs: vec!["Cédula de identidad vigente y comprobante de pago.".to_string()],
                    word_count: 8,
                },
            ],
            total_words: 19,
            navigation_texts: vec!["Inicio".to_string(), "Trámites".to_string()],
            button_texts: vec!["Buscar".to_string()],
            label_texts: vec![
                "Número de documento".to_string(),
                "Fecha de nacimiento".to_string(),
                "Correo electrónico".to_string(),
            ],
            link_texts: vec![
                "Solicitar pasaporte".to_string(),
                "Ver más".to_string(),
                "Requisitos de visa".to_string(),
            ],
        }),
        robots: Some(RobotsInfo {
            exists: true,
            allows_indexing: true,
            sitemaps: vec!["https://www.migracion.gob.bo/sitemap.xml".to_string()],
        }),
        language_parts: None,
        breadcrumbs: Some(BreadcrumbInfo {
            detected: false,
            items: Vec::new(),
            has_structured_data: false,
        }),
    }
}
