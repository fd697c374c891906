//! Runtime configuration.
//!
//! Read from an optional JSON file; every field has a default so a partial
//! file (or no file at all) is valid. Command line flags override on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Directory holding every persisted artifact
    pub models_dir: PathBuf,
    /// Raw paper table used by `index`
    pub data_path: PathBuf,
    pub index: IndexConfig,
    pub cluster: ClusterConfig,
    pub server: ServerConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            data_path: PathBuf::from("data/papers.csv"),
            index: IndexConfig::default(),
            cluster: ClusterConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl ExplorerConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Vectorizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Vocabulary cap, most frequent terms win
    pub max_features: usize,
    /// Inclusive (min, max) n-gram lengths
    pub ngram_range: (usize, usize),
    /// Drop English stop words before building n-grams
    pub stop_words: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            stop_words: true,
        }
    }
}

/// Mini-batch k-means settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub n_clusters: usize,
    pub batch_size: usize,
    /// Number of k-means++ seedings, best inertia wins
    pub n_init: usize,
    pub seed: u64,
    pub max_iter: usize,
    /// Early stop after this many steps without smoothed inertia improving
    pub max_no_improvement: usize,
    /// Feature names listed per cluster in the summary
    pub top_terms: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 20,
            batch_size: 1000,
            n_init: 5,
            seed: 42,
            max_iter: 100,
            max_no_improvement: 10,
            top_terms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub default_top_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            default_top_k: 5,
        }
    }
}
