//! Config schema and deserialization

use crate::analyzer::criteria::RuleSettings;
use crate::analyzer::nlp::DEFAULT_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// error, warn, info, debug or trace. Default: warn
    #[serde(default)]
    pub level: Option<String>,
}

/// Text analysis service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlpConfig {
    /// Call the text analysis service at all. Heuristics are used otherwise.
    #[serde(default)]
    pub enabled: bool,

    /// URL the corpus is POSTed to
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Upper bound on one analysis call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Name of the environment variable holding the bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_key_env: None,
        }
    }
}

impl NlpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Root config structure for .govauditrc.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Minimum total score (exit 1 if any evaluated site is below)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,

    /// Directory holding `<website_id>.json` extractions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_dir: Option<PathBuf>,

    /// Directory of the evaluation store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    #[serde(default)]
    pub nlp: NlpConfig,

    /// Domain suffixes accepted as official hosting. Default: gob.bo
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub official_domains: Vec<String>,

    /// Hosts treated as third-party trackers. Replaces the built-in list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracker_hosts: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        cli_threshold: Option<u8>,
        cli_extraction_dir: Option<PathBuf>,
        cli_store_dir: Option<PathBuf>,
    ) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        if cli_extraction_dir.is_some() {
            self.extraction_dir = cli_extraction_dir;
        }
        if cli_store_dir.is_some() {
            self.store_dir = cli_store_dir;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.extraction_dir.is_none() {
            self.extraction_dir = base.extraction_dir;
        }
        if self.store_dir.is_none() {
            self.store_dir = base.store_dir;
        }

        // nlp: an enabled child wins; otherwise inherit the base block
        if !self.nlp.enabled && self.nlp.endpoint.is_none() {
            self.nlp = base.nlp;
        } else {
            if self.nlp.endpoint.is_none() {
                self.nlp.endpoint = base.nlp.endpoint;
            }
            if self.nlp.api_key_env.is_none() {
                self.nlp.api_key_env = base.nlp.api_key_env;
            }
        }

        // Lists accumulate, base first
        let mut domains = base.official_domains;
        for domain in self.official_domains.drain(..) {
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        self.official_domains = domains;

        if self.tracker_hosts.is_empty() {
            self.tracker_hosts = base.tracker_hosts;
        }

        if self.logging.format == LogFormat::Text {
            self.logging.format = base.logging.format;
        }
        if self.logging.level.is_none() {
            self.logging.level = base.logging.level;
        }
    }

    /// Settings handed to the criterion rules; built-in defaults fill gaps
    pub fn rule_settings(&self) -> RuleSettings {
        let mut settings = RuleSettings::default();
        if !self.official_domains.is_empty() {
            settings.official_domains = self.official_domains.clone();
        }
        if !self.tracker_hosts.is_empty() {
            settings.tracker_hosts = self.tracker_hosts.clone();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.threshold.is_none());
        assert!(!config.nlp.enabled);
        assert_eq!(config.nlp.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.rule_settings().official_domains, vec!["gob.bo"]);
    }

    #[test]
    fn test_camel_case_fields() {
        let config: Config = serde_json::from_str(
            r#"{
                "extractionDir": "data/extractions",
                "nlp": { "enabled": true, "endpoint": "http://localhost:8001/analyze", "timeoutMs": 2500, "apiKeyEnv": "NLP_TOKEN" },
                "officialDomains": ["gob.bo", "edu.bo"],
                "logging": { "format": "json", "level": "debug" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.extraction_dir, Some(PathBuf::from("data/extractions")));
        assert_eq!(config.nlp.timeout(), Duration::from_millis(2500));
        assert_eq!(config.nlp.api_key_env.as_deref(), Some("NLP_TOKEN"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.rule_settings().official_domains.len(), 2);
    }

    #[test]
    fn test_tracker_hosts_replace_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "trackerHosts": ["stats.example.com"] }"#).unwrap();
        assert_eq!(config.rule_settings().tracker_hosts, vec!["stats.example.com"]);
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = Config {
            threshold: Some(60),
            store_dir: Some(PathBuf::from("a")),
            ..Default::default()
        }
        .merge_with_cli(Some(80), None, Some(PathBuf::from("b")));
        assert_eq!(config.threshold, Some(80));
        assert_eq!(config.store_dir, Some(PathBuf::from("b")));
        assert!(config.extraction_dir.is_none());
    }

    #[test]
    fn test_merge_from_keeps_child_values() {
        let mut child: Config =
            serde_json::from_str(r#"{ "threshold": 80, "officialDomains": ["edu.bo"] }"#).unwrap();
        let base: Config = serde_json::from_str(
            r#"{ "threshold": 50, "storeDir": "shared", "officialDomains": ["gob.bo"],
                 "nlp": { "enabled": true, "endpoint": "http://nlp" } }"#,
        )
        .unwrap();
        child.merge_from(base);
        assert_eq!(child.threshold, Some(80));
        assert_eq!(child.store_dir, Some(PathBuf::from("shared")));
        assert_eq!(child.official_domains, vec!["gob.bo", "edu.bo"]);
        assert!(child.nlp.enabled);
    }
}
