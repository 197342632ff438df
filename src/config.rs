//! Configuration management for docsearch
//!
//! Holds the indexing policy, destination storage settings and keyword
//! options, persisted as TOML under `~/.docsearch/config.toml`.

use crate::error::{Error, Result as DocResult};
use crate::types::VolumeId;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Search-index storage engine the keywords end up in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngine {
    /// Generic TEXT column
    #[default]
    Mysql,
    /// Postgres keyword column (tsvector-backed)
    Postgres,
}

impl StorageEngine {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }
}

/// How colliding phrases are resolved when the three n-gram passes merge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep the entry merged first (width 1, then 2, then 3)
    #[default]
    FirstWins,
    /// Keep the position of the first entry but take the higher score
    HighestScore,
}

impl MergeStrategy {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstWins => "first_wins",
            Self::HighestScore => "highest_score",
        }
    }
}

/// Which documents get indexed and how text is pulled out of them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexingPolicy {
    /// Volumes whose documents may be indexed
    #[serde(default)]
    pub index_volumes: Vec<VolumeId>,
    /// Size ceiling in kilobytes
    #[serde(default = "default_maximum_document_size")]
    pub maximum_document_size: u64,
    /// pdftotext binary; `$VAR`, `${VAR}` and `~/` are expanded
    #[serde(default = "default_pdftotext_executable")]
    pub pdftotext_executable: String,
    /// Writable directory the backend runs in (defaults to the temp dir)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
}

fn default_maximum_document_size() -> u64 {
    2048
}

fn default_pdftotext_executable() -> String {
    "pdftotext".to_string()
}

fn default_extraction_timeout_secs() -> u64 {
    30
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            index_volumes: Vec::new(),
            maximum_document_size: default_maximum_document_size(),
            pdftotext_executable: default_pdftotext_executable(),
            working_dir: None,
            extraction_timeout_secs: default_extraction_timeout_secs(),
        }
    }
}

impl IndexingPolicy {
    /// Size ceiling in bytes
    pub fn maximum_document_bytes(&self) -> u64 {
        self.maximum_document_size.saturating_mul(1024)
    }

    /// Resolve the backend executable, expanding environment variables.
    ///
    /// A bare name is looked up on `PATH`; anything containing a path
    /// separator must exist as given.
    pub fn executable_path(&self) -> DocResult<PathBuf> {
        let expanded = expand_env(&self.pdftotext_executable)?;
        if expanded.trim().is_empty() {
            return Err(Error::Config("pdftotext executable is empty".to_string()));
        }

        let candidate = PathBuf::from(&expanded);
        if candidate.components().count() > 1 || candidate.is_absolute() {
            if candidate.is_file() {
                return Ok(candidate);
            }
            return Err(Error::Config(format!(
                "pdftotext executable not found at {}",
                candidate.display()
            )));
        }

        which::which(&expanded).map_err(|e| {
            Error::Config(format!(
                "pdftotext executable '{}' not on PATH: {}",
                expanded, e
            ))
        })
    }

    /// Resolve the directory the backend runs in
    pub fn working_dir(&self) -> DocResult<PathBuf> {
        let dir = match &self.working_dir {
            Some(dir) => PathBuf::from(expand_env(&dir.to_string_lossy())?),
            None => std::env::temp_dir(),
        };
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "working directory {} does not exist",
                dir.display()
            )));
        }
        Ok(dir)
    }
}

/// Destination storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub engine: StorageEngine,
    /// Use this capacity (characters) instead of the engine's
    #[serde(default)]
    pub capacity_override: Option<usize>,
}

/// Keyword reduction options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordConfig {
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    /// Stop-word language used when the document's language has none
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
}

fn default_fallback_language() -> String {
    "en".to_string()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            merge_strategy: MergeStrategy::default(),
            fallback_language: default_fallback_language(),
        }
    }
}

/// docsearch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub policy: IndexingPolicy,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
}


impl Config {
    /// Get the config file path (~/.docsearch/config.toml)
    pub fn path() -> Result<PathBuf> {
        Ok(docsearch_dir()?.join("config.toml"))
    }

    /// Check if config exists
    pub fn exists() -> bool {
        Self::path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Load config from the default location, or None if it doesn't exist
    pub fn load() -> Result<Option<Self>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Check the deployment-level settings before any document is processed
    pub fn validate(&self) -> DocResult<()> {
        self.policy.executable_path()?;
        self.policy.working_dir()?;
        if self.policy.extraction_timeout_secs == 0 {
            return Err(Error::Config("extraction_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Get the base docsearch directory path (~/.docsearch)
pub fn docsearch_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".docsearch"))
}

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env var pattern is valid")
});

/// Expand `$VAR`, `${VAR}` and a leading `~/` in a configured path.
///
/// An unset variable is a configuration error.
pub fn expand_env(value: &str) -> DocResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;

    for caps in ENV_VAR.captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let resolved = std::env::var(name)
            .map_err(|_| Error::Config(format!("environment variable ${} is not set", name)))?;

        out.push_str(&value[last..whole.start()]);
        out.push_str(&resolved);
        last = whole.end();
    }
    out.push_str(&value[last..]);

    if let Some(rest) = out.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
        return Ok(home.join(rest).to_string_lossy().into_owned());
    }

    Ok(out)
}
