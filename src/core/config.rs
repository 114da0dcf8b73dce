//! Configuration loading
//!
//! Settings come from `config.yaml` in the user's config directory and can be
//! overridden with environment variables:
//!
//! - `LIMS_HOME`: relocates config, session, and drafts into one directory
//! - `LIMS_API_URL`: base URL shared by every endpoint
//! - `LIMS_PAGE_SIZE`: default rows per page
//! - `LIMS_TIMEOUT_SECS`: HTTP request timeout

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::pagination::PAGE_SIZE_OPTIONS;
use crate::core::search::SearchScope;

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid page size {0}; choose one of 5, 10, 20, 50, 100")]
    PageSize(usize),

    #[error("Request timeout must be at least 1 second")]
    Timeout,
}

/// User-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the LIMS REST API
    pub api_url: String,

    /// Default rows per page for list views
    pub page_size: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Rows requested when filling a select input from a lookup
    pub lookup_limit: usize,

    /// Delay before a saved form returns to its list view
    pub redirect_delay_ms: u64,

    /// Where list searches are evaluated
    pub search_scope: SearchScope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: 10,
            timeout_secs: 30,
            lookup_limit: 500,
            redirect_delay_ms: 1500,
            search_scope: SearchScope::Page,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    ///
    /// A malformed file is reported as a warning rather than aborting the command.
    pub fn load() -> Self {
        let path = config_path();
        let config = if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("{}; using defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `LIMS_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("LIMS_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Some(size) = env_number("LIMS_PAGE_SIZE") {
            if PAGE_SIZE_OPTIONS.contains(&size) {
                self.page_size = size;
            } else {
                tracing::warn!("Ignoring LIMS_PAGE_SIZE={}", size);
            }
        }
        if let Some(secs) = env_number("LIMS_TIMEOUT_SECS") {
            if secs > 0 {
                self.timeout_secs = secs as u64;
            } else {
                tracing::warn!("Ignoring LIMS_TIMEOUT_SECS={}", secs);
            }
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !PAGE_SIZE_OPTIONS.contains(&self.page_size) {
            return Err(ConfigError::PageSize(self.page_size));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Timeout);
        }
        Ok(())
    }

    /// Endpoint URL for a path such as `/department`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

fn env_number(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "lims", "lims-console")
}

/// Directory holding the session file and saved drafts
pub fn state_dir() -> PathBuf {
    if let Ok(home) = std::env::var("LIMS_HOME") {
        return PathBuf::from(home);
    }
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".lims"))
}

/// Location of `config.yaml`
pub fn config_path() -> PathBuf {
    if let Ok(home) = std::env::var("LIMS_HOME") {
        return PathBuf::from(home).join(CONFIG_FILE);
    }
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(".lims").join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.search_scope, SearchScope::Page);
        assert_eq!(
            config.endpoint_url("/department"),
            "http://localhost:3000/api/department"
        );
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "api_url: https://lims.example.org/\nsearch_scope: server\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://lims.example.org/");
        assert_eq!(config.search_scope, SearchScope::Server);
        assert_eq!(config.page_size, 10);
        assert_eq!(
            config.endpoint_url("/role"),
            "https://lims.example.org/role"
        );
    }

    #[test]
    fn test_rejects_unknown_page_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "page_size: 7\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::PageSize(7))
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "timeout_secs: 0\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Timeout)
        ));
    }

    #[test]
    fn test_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "page_size: [not a number\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
