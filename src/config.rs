//! Configuration for the annotation pipeline.
//!
//! Sources (highest priority first):
//! 1. Environment variables (CHRONOTAG_API_KEY, CHRONOTAG_MODEL)
//! 2. Config file (.chronotag/config.yaml)
//! 3. Built-in defaults
//!
//! Config file discovery walks the current directory and its parents.
//! Relative paths inside language profiles are resolved against the
//! directory that contains `.chronotag/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusColumns;
use crate::driver::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub api: ApiFileConfig,
    #[serde(default)]
    pub languages: BTreeMap<String, LanguageProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiFileConfig {
    pub key: Option<String>,
    pub model: Option<String>,
    /// Requests allowed per period (token-bucket capacity).
    pub max_requests: Option<u32>,
    /// Refill period in seconds.
    pub period_seconds: Option<u64>,
    pub retry: Option<RetryPolicy>,
}

/// Per-language corpus and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageProfile {
    /// Corpus CSV export.
    pub corpus_csv: PathBuf,
    /// CSV delimiter (a one-character string in YAML).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Column names of the export.
    #[serde(default)]
    pub columns: CorpusColumns,
    /// Annotation-project export with the tag definitions.
    pub tagset_json: PathBuf,
    /// Directory of hand-annotated example exports.
    pub examples_dir: PathBuf,
    /// How many few-shot examples to include in the prompt.
    #[serde(default = "default_example_count")]
    pub example_count: usize,
    /// Where the annotated JSONL corpus is appended.
    pub output_jsonl: PathBuf,
}

fn default_delimiter() -> char {
    ','
}

fn default_example_count() -> usize {
    5
}

/// Resolved configuration with absolute paths and defaults filled in.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_requests: u32,
    pub period_seconds: u64,
    pub retry: RetryPolicy,
    pub languages: BTreeMap<String, LanguageProfile>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-pro".to_string(),
            max_requests: 10,
            period_seconds: 1,
            retry: RetryPolicy::default(),
            languages: BTreeMap::new(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Look up a language profile by name.
    pub fn language(&self, name: &str) -> Result<&LanguageProfile> {
        self.languages.get(name).with_context(|| {
            let known: Vec<&str> = self.languages.keys().map(String::as_str).collect();
            format!(
                "Unknown language '{}'. Configured languages: {}",
                name,
                if known.is_empty() {
                    "(none)".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }
}

/// Find config file by searching current directory and parents, then the
/// home directory
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".chronotag").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".chronotag").join("config.yaml");
    if home_config.exists() {
        return Some(home_config);
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn resolve_profile_paths(profile: &mut LanguageProfile, base: &Path) {
    profile.corpus_csv = resolve_path(base, &profile.corpus_csv);
    profile.tagset_json = resolve_path(base, &profile.tagset_json);
    profile.examples_dir = resolve_path(base, &profile.examples_dir);
    profile.output_jsonl = resolve_path(base, &profile.output_jsonl);
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    let config_file = find_config_file();
    if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Project root is the parent of .chronotag/
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        if let Some(key) = config.api.key {
            resolved.api_key = Some(key);
        }
        if let Some(model) = config.api.model {
            resolved.model = model;
        }
        if let Some(max_requests) = config.api.max_requests {
            resolved.max_requests = max_requests;
        }
        if let Some(period) = config.api.period_seconds {
            resolved.period_seconds = period;
        }
        if let Some(retry) = config.api.retry {
            resolved.retry = retry;
        }

        resolved.languages = config.languages;
        for profile in resolved.languages.values_mut() {
            resolve_profile_paths(profile, &base_dir);
        }
    }

    // Env vars override the file.
    if let Ok(key) = std::env::var("CHRONOTAG_API_KEY") {
        if !key.is_empty() {
            resolved.api_key = Some(key);
        }
    }
    if let Ok(model) = std::env::var("CHRONOTAG_MODEL") {
        if !model.is_empty() {
            resolved.model = model;
        }
    }

    resolved.config_file = config_file;
    Ok(resolved)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
