//! The update pipeline.
//!
//! [`Updater`] runs the four stages in order and stops at the first failure:
//!
//! 1. detect the platform ([`PlatformTag::detect`])
//! 2. resolve the latest release asset ([`ReleaseClient::resolve_asset`])
//! 3. download it ([`Downloader::download`])
//! 4. extract it and remove the archive ([`install_archive`])
//!
//! Nothing is retried and an extraction that already wrote files is not rolled
//! back. Running the pipeline twice against the same release leaves the
//! installation directory in the same state as running it once.

use crate::archive::{InstallOptions, install_archive};
use crate::config::UpdaterConfig;
use crate::core::{Result, Stage, UpdaterError};
use crate::download::Downloader;
use crate::platform::PlatformTag;
use crate::release::{ReleaseClient, ResolvedAsset};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error, info};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Platform the asset was selected for
    pub platform: PlatformTag,
    /// Tag of the installed release
    pub release_tag: String,
    /// Name of the downloaded asset
    pub asset_name: String,
    /// URL the archive was downloaded from
    pub url: String,
    /// Where the archive was written
    pub archive_path: PathBuf,
    /// Size of the archive in bytes
    pub bytes: u64,
    /// Whether the archive was extracted
    pub extracted: bool,
    /// Whether the archive was deleted afterwards
    pub archive_removed: bool,
}

/// Runs the update pipeline for one configuration.
pub struct Updater {
    config: UpdaterConfig,
    show_progress: bool,
}

impl Updater {
    /// Create an updater. Progress bars are off until enabled with
    /// [`with_progress`](Self::with_progress).
    #[must_use]
    pub const fn new(config: UpdaterConfig) -> Self {
        Self {
            config,
            show_progress: false,
        }
    }

    /// Show a progress bar while downloading.
    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The configuration this updater runs with.
    #[must_use]
    pub const fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Run every stage and report what was installed.
    ///
    /// On failure the stage that failed is logged at `error` level and the
    /// error is returned unchanged.
    pub async fn run(&self) -> Result<UpdateReport> {
        info!("Starting Trilium updater");
        let mut stage = Stage::Start;

        match self.run_stages(&mut stage).await {
            Ok(report) => {
                info!("Update successful !");
                Ok(report)
            }
            Err(e) => {
                error!("Update failed while {} (last completed stage: {stage}): {e}", stage.next_step());
                Err(e)
            }
        }
    }

    /// Resolve the asset that [`run`](Self::run) would install, without
    /// downloading anything.
    pub async fn check(&self) -> Result<(PlatformTag, ResolvedAsset)> {
        let platform = PlatformTag::detect();
        let asset = ReleaseClient::new(&self.config)?.resolve_asset(platform).await?;
        Ok((platform, asset))
    }

    async fn run_stages(&self, stage: &mut Stage) -> Result<UpdateReport> {
        let platform = PlatformTag::detect();
        advance(stage, Stage::PlatformDetected);

        let asset = ReleaseClient::new(&self.config)?.resolve_asset(platform).await?;
        advance(stage, Stage::AssetResolved);

        let archive_dir = self.config.archive_dir();
        fs::create_dir_all(archive_dir)
            .await
            .map_err(|e| UpdaterError::filesystem("create directory", archive_dir, e))?;

        let downloaded = Downloader::new(&self.config, self.show_progress)?
            .download(&asset.name, &asset.url, archive_dir)
            .await?;
        advance(stage, Stage::Downloaded);

        let mut report = UpdateReport {
            platform,
            release_tag: asset.release_tag,
            asset_name: asset.name,
            url: asset.url,
            archive_path: downloaded.path,
            bytes: downloaded.bytes,
            extracted: false,
            archive_removed: false,
        };

        if !self.config.perform_extraction {
            info!("Extraction disabled, keeping {}", report.archive_path.display());
            advance(stage, Stage::Done);
            return Ok(report);
        }

        let options = InstallOptions {
            overwrite: true,
            strict_cleanup: self.config.strict_cleanup,
        };
        let outcome =
            install_archive(&report.asset_name, archive_dir, &self.config.install_dir, options).await?;
        advance(stage, Stage::Extracted);
        report.extracted = true;

        report.archive_removed = outcome.archive_removed;
        advance(stage, Stage::CleanedUp);

        advance(stage, Stage::Done);
        Ok(report)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("Stage {stage} -> {next}");
    *stage = next;
}
