//! Configuration loading for govaudit

mod schema;

pub use schema::{Config, LogFormat, LoggingConfig, NlpConfig};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".govauditrc.json";

/// Default threshold written by `govaudit init`
pub const DEFAULT_INIT_THRESHOLD: u8 = 70;

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => load_config_with_extends(&path, &mut HashSet::new()),
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    // Directories are relative to the file that names them
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    config.extraction_dir = config.extraction_dir.map(|d| anchor(config_dir, d));
    config.store_dir = config.store_dir.map(|d| anchor(config_dir, d));

    if let Some(extends) = config.extends.take() {
        let base_config = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base_config);
    }

    Ok(config)
}

fn anchor(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}

/// Resolve an extends reference to a config
fn resolve_extends(
    config_path: &Path,
    extends: &str,
    visited: &mut HashSet<PathBuf>,
) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let extends_path = anchor(config_dir, PathBuf::from(extends));

    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

/// Search for .govauditrc.json in directory and its parents
fn find_config_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Contents of the file written by `govaudit init`
pub fn default_config_json(threshold: Option<u8>) -> Result<String> {
    let config = Config {
        threshold: Some(threshold.unwrap_or(DEFAULT_INIT_THRESHOLD)),
        extraction_dir: Some(PathBuf::from(crate::extraction::DEFAULT_EXTRACTION_DIR)),
        store_dir: Some(PathBuf::from(crate::store::DEFAULT_STORE_DIR)),
        official_domains: vec![crate::analyzer::criteria::sovereignty::DEFAULT_OFFICIAL_DOMAIN.to_string()],
        logging: LoggingConfig {
            level: Some("warn".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    json.push('\n');
    Ok(json)
}

/// Write a default config into `dir`. Returns `None` when one already exists.
pub fn write_default_config(dir: &Path, threshold: Option<u8>) -> Result<Option<PathBuf>> {
    let config_path = dir.join(CONFIG_FILENAME);
    if config_path.exists() {
        return Ok(None);
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    fs::write(&config_path, default_config_json(threshold)?)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(Some(config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert!(config.threshold.is_none());
        assert!(config.extends.is_none());
    }

    #[test]
    fn test_custom_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_found_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{ "threshold": 65 }"#).unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested, None).unwrap();
        assert_eq!(config.threshold, Some(65));
    }

    #[test]
    fn test_config_extends() {
        let dir = TempDir::new().unwrap();

        let base_path = dir.path().join("base.json");
        let mut base_file = fs::File::create(&base_path).unwrap();
        writeln!(
            base_file,
            r#"{{
                "threshold": 70,
                "storeDir": "store",
                "officialDomains": ["gob.bo"],
                "trackerHosts": ["stats.example.com"]
            }}"#
        )
        .unwrap();

        let child_path = dir.path().join(CONFIG_FILENAME);
        let mut child_file = fs::File::create(&child_path).unwrap();
        writeln!(
            child_file,
            r#"{{
                "extends": "./base.json",
                "threshold": 80,
                "officialDomains": ["edu.bo"]
            }}"#
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();

        // Child threshold overrides base
        assert_eq!(config.threshold, Some(80));
        // Base store dir is inherited, anchored at the base file
        assert_eq!(config.store_dir, Some(dir.path().join("store")));
        assert_eq!(config.official_domains, vec!["gob.bo", "edu.bo"]);
        assert_eq!(config.tracker_hosts, vec!["stats.example.com"]);
    }

    #[test]
    fn test_extends_without_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shared.json"), r#"{ "threshold": 55 }"#).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "extends": "shared" }"#,
        )
        .unwrap();
        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.threshold, Some(55));
    }

    #[test]
    fn test_circular_extends_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{ "extends": "./b.json" }"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{ "extends": "./a.json" }"#).unwrap();

        let err = load_config(dir.path(), Some(Path::new("a.json"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Circular extends"));
    }

    #[test]
    fn test_missing_extended_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "extends": "./gone.json" }"#,
        )
        .unwrap();
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Extended config not found"));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON in config"));
    }

    #[test]
    fn test_write_default_config_once() {
        let dir = TempDir::new().unwrap();
        let written = write_default_config(dir.path(), Some(85)).unwrap();
        assert_eq!(written, Some(dir.path().join(CONFIG_FILENAME)));
        assert!(write_default_config(dir.path(), None).unwrap().is_none());

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.threshold, Some(85));
        assert_eq!(config.official_domains, vec!["gob.bo"]);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
    }
}
