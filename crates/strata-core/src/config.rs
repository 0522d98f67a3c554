use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;

/// Relative location of the project config file.
pub const CONFIG_FILE: &str = ".strata/config.toml";

/// Environment variable overriding the cache path.
pub const GRAPH_PATH_ENV: &str = "STRATA_GRAPH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::FileSystem,
            Self::Parse { .. } => ErrorCode::ConfigParse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StrataConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_cache_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
        }
    }
}

impl StrataConfig {
    /// Absolute cache path for `project_root`, honoring `STRATA_GRAPH`.
    #[must_use]
    pub fn cache_path(&self, project_root: &Path) -> PathBuf {
        let env_path = env::var(GRAPH_PATH_ENV).ok();
        resolve_cache_path(project_root, &self.cache.path, env_path.as_deref())
    }
}

/// Load `.strata/config.toml` from `project_root`, or defaults when absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<StrataConfig, ConfigError> {
    let path = project_root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(StrataConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    toml::from_str::<StrataConfig>(&content).map_err(|source| ConfigError::Parse { path, source })
}

fn resolve_cache_path(project_root: &Path, configured: &Path, env_path: Option<&str>) -> PathBuf {
    let chosen = match env_path.map(str::trim) {
        Some(raw) if !raw.is_empty() => PathBuf::from(raw),
        _ => configured.to_path_buf(),
    };
    if chosen.is_absolute() {
        chosen
    } else {
        project_root.join(chosen)
    }
}

const fn default_true() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".strata/graph.json")
}

const fn default_max_nodes() -> usize {
    10_000
}
