//! HTTP client for a remote text-analysis service
//!
//! Requires the `nlp` feature:
//! ```toml
//! govaudit = { version = "0.4", features = ["nlp"] }
//! ```

use super::{TextAnalysis, TextAnalyzer};
use crate::error::TextAnalysisError;
use crate::extraction::TextCorpus;
use async_trait::async_trait;

/// POSTs the text corpus as JSON and expects a `TextAnalysis` document back
pub struct HttpTextAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTextAnalyzer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Sent as a bearer token when present
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextAnalyzer for HttpTextAnalyzer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn analyze(&self, corpus: &TextCorpus) -> Result<TextAnalysis, TextAnalysisError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(corpus);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                TextAnalysisError::Unavailable(e.to_string())
            } else {
                TextAnalysisError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(TextAnalysisError::Unavailable(status.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TextAnalysisError::RequestFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        response
            .json::<TextAnalysis>()
            .await
            .map_err(|e| TextAnalysisError::InvalidResponse(e.to_string()))
    }
}
