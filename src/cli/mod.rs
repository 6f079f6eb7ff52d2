//! Command-line interface for the Trilium updater.
//!
//! The updater takes no required arguments: run it from the Trilium
//! installation directory and it installs the newest release for the current
//! operating system.
//!
//! ```bash
//! # Update the installation in the current directory
//! trilium-updater
//!
//! # Updater shipped one level below the application
//! trilium-updater --install-dir ../
//!
//! # Only download the archive
//! trilium-updater --no-extract --download-dir ~/Downloads
//!
//! # Show what would be installed
//! trilium-updater --check
//! ```
//!
//! Flags override values from the configuration file, see
//! [`UpdaterConfig`](crate::config::UpdaterConfig).
//!
//! # Logging
//!
//! Progress is logged to stdout through `tracing`. `RUST_LOG` takes precedence
//! over `--verbose` and `--quiet` when set.

use crate::config::UpdaterConfig;
use crate::core::UpdaterError;
use crate::pipeline::Updater;
use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::BoolishValueParser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one without parsing
/// arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: Option<String>,

    /// Whether to hide the download progress bar.
    pub no_progress: bool,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with no log level and progress enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Enable or disable progress output.
    #[must_use]
    pub const fn with_no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }
}

/// Download and install the latest Trilium release.
#[derive(Parser, Debug)]
#[command(
    name = "trilium-updater",
    about = "Download and install the latest Trilium release",
    version,
    long_about = "Fetches the newest Trilium release for this operating system from GitHub, \
                  extracts it over the installation directory and removes the downloaded archive."
)]
pub struct Cli {
    /// Configuration file (TOML).
    ///
    /// Defaults to `<config dir>/trilium-updater/config.toml` when that file
    /// exists.
    #[arg(short, long, env = "TRILIUM_UPDATER_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Owner of the GitHub repository that publishes the releases.
    #[arg(long)]
    owner: Option<String>,

    /// Repository name; also the prefix of every asset name.
    #[arg(long)]
    repo: Option<String>,

    /// Directory to extract the release into.
    #[arg(short = 'd', long, value_name = "DIR")]
    install_dir: Option<PathBuf>,

    /// Directory to save the archive in (default: the install directory).
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Only download the archive; do not extract or remove it.
    #[arg(long)]
    no_extract: bool,

    /// Fail when the archive cannot be removed after extraction.
    #[arg(long)]
    strict_cleanup: bool,

    /// HTTP request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Base URL of the GitHub API (GitHub Enterprise, mirrors).
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Print the release asset that would be installed and exit.
    #[arg(long)]
    check: bool,

    /// Log debug details (requests, asset selection, stage changes).
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Hide the download progress bar.
    ///
    /// The environment variable accepts `1`/`0`, `yes`/`no`, `on`/`off` and
    /// `true`/`false`.
    #[arg(long, env = "TRILIUM_UPDATER_NO_PROGRESS", value_parser = BoolishValueParser::new())]
    no_progress: bool,
}

impl Cli {
    /// Run the updater with the parsed arguments.
    ///
    /// Installs the logging subscriber, resolves the configuration and runs
    /// the pipeline until it finishes or `Ctrl-C` is pressed.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` maps to `debug`, `--quiet` to `error`, and the default is
    /// `info`. Progress is hidden with `--no-progress` or `--quiet`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            no_progress: self.no_progress || self.quiet,
            config_path: self.config.clone(),
        }
    }

    /// Run with an explicit [`CliConfig`].
    pub async fn execute_with_config(self, cli_config: CliConfig) -> Result<()> {
        init_logging(cli_config.log_level.as_deref());

        let config = self.resolve_config(&cli_config).await?;
        let updater = Updater::new(config).with_progress(!cli_config.no_progress);

        tokio::select! {
            result = self.run(&updater) => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping the update");
                Err(UpdaterError::Cancelled.into())
            }
        }
    }

    /// Load the configuration file and apply flag overrides on top.
    pub async fn resolve_config(&self, cli_config: &CliConfig) -> Result<UpdaterConfig> {
        let mut config = UpdaterConfig::load(cli_config.config_path.as_deref()).await?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut UpdaterConfig) {
        if let Some(owner) = &self.owner {
            config.owner.clone_from(owner);
        }
        if let Some(repo) = &self.repo {
            config.repo.clone_from(repo);
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir.clone_from(dir);
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = Some(dir.clone());
        }
        if self.no_extract {
            config.perform_extraction = false;
        }
        if self.strict_cleanup {
            config.strict_cleanup = true;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(url) = &self.api_url {
            config.api_url.clone_from(url);
        }
    }

    async fn run(&self, updater: &Updater) -> Result<()> {
        if self.check {
            let (platform, asset) = updater.check().await.context("Failed to resolve the latest release")?;
            println!("{} {}", "Latest release:".bold(), asset.release_tag.green());
            println!("{} {platform}", "Platform:".bold());
            println!("{} {}", "Asset:".bold(), asset.name);
            println!("{} {}", "URL:".bold(), asset.url);
            return Ok(());
        }

        let report = updater.run().await?;
        if report.extracted {
            println!(
                "{} {} into {}",
                "Installed".green().bold(),
                report.release_tag,
                updater.config().install_dir.display()
            );
        } else {
            println!(
                "{} {} to {}",
                "Downloaded".green().bold(),
                report.asset_name,
                report.archive_path.display()
            );
        }
        Ok(())
    }
}

/// Install the global `tracing` subscriber writing to stdout.
///
/// `RUST_LOG` wins over `level` when set. Calling this more than once is
/// harmless; later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level.unwrap_or("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}
