//! Updater configuration.
//!
//! The project coordinates and install locations are plain values passed into
//! the pipeline instead of compiled-in constants, so the "install here" and
//! "install into the parent directory" deployments, with or without
//! extraction, share a single code path.
//!
//! # Sources
//!
//! Configuration is resolved in this order, later entries winning:
//!
//! 1. Built-in defaults (`zadam/trilium`, current directory, extraction on)
//! 2. A TOML file: the path given with `--config` / `TRILIUM_UPDATER_CONFIG`,
//!    or `<config dir>/trilium-updater/config.toml` when it exists
//! 3. Command-line flags
//!
//! # File Format
//!
//! ```toml
//! owner = "zadam"
//! repo = "trilium"
//! install_dir = "../"
//! perform_extraction = true
//! strict_cleanup = false
//! timeout_secs = 300
//! ```

use crate::core::{Result, UpdaterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Default GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Full configuration of one updater run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Owner of the repository that publishes the releases.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name. Also the prefix every matching asset name starts with.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Directory the archive is extracted into.
    ///
    /// Trilium ships the updater next to the application (`./`) or one level
    /// inside it (`../`).
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Directory the archive is downloaded to. Defaults to `install_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Whether to extract the archive after download.
    ///
    /// When disabled the run stops after the download and the archive is kept.
    #[serde(default = "default_perform_extraction")]
    pub perform_extraction: bool,

    /// Whether failing to delete the archive after extraction fails the run.
    #[serde(default)]
    pub strict_cleanup: bool,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Upper bound for an API request. For archive downloads it is the
    /// longest the server may stay silent mid-transfer.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound for establishing a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_owner() -> String {
    "zadam".to_string()
}

fn default_repo() -> String {
    "trilium".to_string()
}

fn default_install_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_perform_extraction() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            install_dir: default_install_dir(),
            download_dir: None,
            perform_extraction: default_perform_extraction(),
            strict_cleanup: false,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// An explicitly given path must exist. The default location is optional
    /// and falls back to [`UpdaterConfig::default`].
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path).await,
                _ => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from a specific TOML file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|e| UpdaterError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;

        toml::from_str(&content).map_err(|e| UpdaterError::Config {
            message: format!("invalid TOML in {}: {e}", path.display()),
        })
    }

    /// Default configuration file location:
    /// `<config dir>/trilium-updater/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trilium-updater").join("config.toml"))
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(config_error("owner must not be empty"));
        }
        if self.repo.trim().is_empty() {
            return Err(config_error("repo must not be empty"));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(config_error("timeouts must be at least one second"));
        }
        reqwest::Url::parse(&self.api_url)
            .map_err(|e| config_error(format!("api_url '{}' is not a valid URL: {e}", self.api_url)))?;
        Ok(())
    }

    /// Directory the archive is written to before extraction.
    #[must_use]
    pub fn archive_dir(&self) -> &Path {
        self.download_dir.as_deref().unwrap_or(&self.install_dir)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

fn config_error(message: impl Into<String>) -> UpdaterError {
    UpdaterError::Config {
        message: message.into(),
    }
}
